use anyhow::{Context, Result};
use directories::ProjectDirs;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

lazy_static! {
    /// Commands for which checking the just-typed word is deferred until
    /// idle time, so typing does not trigger a backend round trip on every
    /// keystroke.
    pub static ref DEFAULT_DELAYED_COMMANDS: Vec<&'static str> = vec![
        "insert-char",
        "delete-backward-char",
        "backward-or-forward-delete-char",
        "delete-char",
        "quoted-insert",
    ];

    /// Movement commands: checking is skipped while the same one repeats.
    pub static ref DEFAULT_MOVEMENT_COMMANDS: Vec<&'static str> = vec![
        "forward-char",
        "backward-char",
        "forward-word",
        "backward-word",
        "next-line",
        "previous-line",
        "scroll-up",
        "scroll-down",
        "beginning-of-line",
        "end-of-line",
    ];

    /// Transposition-style edits force a check of the word at the prior
    /// point before anything else.
    pub static ref DEFAULT_TRANSPOSITION_COMMANDS: Vec<&'static str> =
        vec!["transpose-chars", "transpose-words"];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Language passed to the backend (e.g. en_US).
    pub language: String,

    /// Backend program spoken to over the ispell line protocol.
    #[serde(default = "default_backend_program")]
    pub backend_program: String,

    pub personal_dictionary: Option<PathBuf>,

    /// Explicit word-character set declared by the active dictionary.
    /// `None` means any Unicode alphabetic character.
    #[serde(default)]
    pub word_chars: Option<String>,

    /// Characters admissible inside a word only between two word chars
    /// (apostrophes, typically).
    #[serde(default = "default_other_chars")]
    pub other_chars: String,

    /// Whether more than one other-char bridge may appear in a single word.
    #[serde(default)]
    pub many_other_chars: bool,

    /// Flag immediately repeated words as doublons.
    #[serde(default = "default_true")]
    pub mark_duplications: bool,

    /// Case-fold the comparison when looking for doublons.
    #[serde(default = "default_true")]
    pub case_fold_duplications: bool,

    /// Words legitimately doubled in the active language, never doublons.
    #[serde(default = "default_duplication_exceptions")]
    pub duplication_exceptions: Vec<String>,

    /// Byte distance searched for a second occurrence of a misspelled word.
    /// Negative means unbounded, zero disables the escalation entirely.
    #[serde(default = "default_duplicate_distance")]
    pub duplicate_distance: i64,

    /// Sort correction candidates (lexicographic); when off, backend order.
    #[serde(default = "default_true")]
    pub sort_candidates: bool,

    /// Keep annotations alive until corrected or re-verified. When off, at
    /// most one annotation is alive buffer-wide.
    #[serde(default = "default_true")]
    pub persistent_highlight: bool,

    /// Install a highlight even when a foreign annotation already occupies
    /// the start offset.
    #[serde(default = "default_true")]
    pub highlight_over_others: bool,

    /// Regions larger than this go through the bulk backend invocation.
    #[serde(default = "default_large_region_threshold")]
    pub large_region_threshold: usize,

    /// Idle delay, in seconds, before a deferred check fires.
    #[serde(default = "default_idle_delay")]
    pub idle_delay_secs: f64,

    /// User extensions to the built-in command classifications.
    #[serde(default)]
    pub extra_delayed_commands: Vec<String>,
    #[serde(default)]
    pub extra_movement_commands: Vec<String>,
    #[serde(default)]
    pub extra_transposition_commands: Vec<String>,
}

fn default_backend_program() -> String {
    "aspell".to_string()
}

fn default_other_chars() -> String {
    "'".to_string()
}

fn default_true() -> bool {
    true
}

fn default_duplication_exceptions() -> Vec<String> {
    vec!["that".to_string(), "had".to_string()]
}

fn default_duplicate_distance() -> i64 {
    400_000
}

fn default_large_region_threshold() -> usize {
    1000
}

fn default_idle_delay() -> f64 {
    3.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language: "en_US".to_string(),
            backend_program: default_backend_program(),
            personal_dictionary: None,
            word_chars: None,
            other_chars: default_other_chars(),
            many_other_chars: false,
            mark_duplications: true,
            case_fold_duplications: true,
            duplication_exceptions: default_duplication_exceptions(),
            duplicate_distance: default_duplicate_distance(),
            sort_candidates: true,
            persistent_highlight: true,
            highlight_over_others: true,
            large_region_threshold: default_large_region_threshold(),
            idle_delay_secs: default_idle_delay(),
            extra_delayed_commands: Vec::new(),
            extra_movement_commands: Vec::new(),
            extra_transposition_commands: Vec::new(),
        }
    }
}

/// Command-identifier classification, resolved once from the defaults plus
/// the user extensions. Read-only during normal operation; classification
/// at runtime is a set-membership test.
#[derive(Debug, Clone)]
pub struct CommandClasses {
    pub delayed: HashSet<String>,
    pub movement: HashSet<String>,
    pub transposition: HashSet<String>,
}

impl EngineConfig {
    /// Load configuration with priority: CLI args > local config > global
    /// config > defaults.
    pub fn load(language: Option<String>, personal_dict: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global_config = Self::from_file(&global_path)?;
                config = config.merge(global_config);
            }
        }

        let local_path = PathBuf::from(".spellmark.toml");
        if local_path.exists() {
            let local_config = Self::from_file(&local_path)?;
            config = config.merge(local_config);
        }

        if let Some(language) = language {
            config.language = language;
        }
        if let Some(dict) = personal_dict {
            config.personal_dictionary = Some(dict);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(mut self, other: Self) -> Self {
        if other.language != "en_US" {
            self.language = other.language;
        }
        if other.backend_program != default_backend_program() {
            self.backend_program = other.backend_program;
        }
        if other.personal_dictionary.is_some() {
            self.personal_dictionary = other.personal_dictionary;
        }
        if other.word_chars.is_some() {
            self.word_chars = other.word_chars;
        }
        if other.other_chars != default_other_chars() {
            self.other_chars = other.other_chars;
        }
        self.many_other_chars = other.many_other_chars;
        self.mark_duplications = other.mark_duplications;
        self.case_fold_duplications = other.case_fold_duplications;
        if other.duplication_exceptions != default_duplication_exceptions() {
            self.duplication_exceptions = other.duplication_exceptions;
        }
        if other.duplicate_distance != default_duplicate_distance() {
            self.duplicate_distance = other.duplicate_distance;
        }
        self.sort_candidates = other.sort_candidates;
        self.persistent_highlight = other.persistent_highlight;
        self.highlight_over_others = other.highlight_over_others;
        if other.large_region_threshold != default_large_region_threshold() {
            self.large_region_threshold = other.large_region_threshold;
        }
        if (other.idle_delay_secs - default_idle_delay()).abs() > f64::EPSILON {
            self.idle_delay_secs = other.idle_delay_secs;
        }
        self.extra_delayed_commands.extend(other.extra_delayed_commands);
        self.extra_movement_commands.extend(other.extra_movement_commands);
        self.extra_transposition_commands
            .extend(other.extra_transposition_commands);
        self
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellmark").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolve the command classification sets from the built-in defaults
    /// plus the configured extensions.
    pub fn command_classes(&self) -> CommandClasses {
        let mut delayed: HashSet<String> = DEFAULT_DELAYED_COMMANDS
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        delayed.extend(self.extra_delayed_commands.iter().cloned());

        let mut movement: HashSet<String> = DEFAULT_MOVEMENT_COMMANDS
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        movement.extend(self.extra_movement_commands.iter().cloned());

        let mut transposition: HashSet<String> = DEFAULT_TRANSPOSITION_COMMANDS
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        transposition.extend(self.extra_transposition_commands.iter().cloned());

        CommandClasses {
            delayed,
            movement,
            transposition,
        }
    }

    /// Word-boundary character class declared by the active dictionary.
    pub fn is_word_char(&self, ch: char) -> bool {
        match &self.word_chars {
            Some(set) => set.contains(ch),
            None => ch.is_alphabetic(),
        }
    }

    /// Characters allowed inside a word only between two word chars.
    pub fn is_other_char(&self, ch: char) -> bool {
        self.other_chars.contains(ch)
    }
}
