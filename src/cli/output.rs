use crate::{AnnotationKind, Span};
use colored::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One flagged word, positioned for human consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedWord {
    pub word: String,
    pub line: usize,
    pub column: usize,
    pub kind: String,
    pub suggestions: Vec<String>,
    pub context: String,
}

impl FlaggedWord {
    /// Build a report entry from a flagged span in `text`. Line and column
    /// are 1-based; the column counts characters, not bytes.
    pub fn from_span(
        text: &str,
        span: Span,
        kind: AnnotationKind,
        suggestions: Vec<String>,
    ) -> Self {
        let before = &text[..span.start];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = text[line_start..span.start].chars().count() + 1;
        let line_end = text[span.start..]
            .find('\n')
            .map(|i| span.start + i)
            .unwrap_or(text.len());

        Self {
            word: text[span.start..span.end].to_string(),
            line,
            column,
            kind: kind_name(kind).to_string(),
            suggestions,
            context: text[line_start..line_end].to_string(),
        }
    }
}

fn kind_name(kind: AnnotationKind) -> &'static str {
    match kind {
        AnnotationKind::Misspelled => "misspelled",
        AnnotationKind::Doublon => "doubled-word",
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonOutput {
    files_checked: usize,
    total_flagged: usize,
    flags: Vec<JsonFlag>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonFlag {
    file: String,
    #[serde(flatten)]
    flag: FlaggedWord,
}

pub fn print_flags(
    file_path: &Path,
    flags: &[FlaggedWord],
    colored_output: bool,
    format: &OutputFormat,
) {
    match format {
        OutputFormat::Text => print_text_flags(file_path, flags, colored_output),
        OutputFormat::Json => print_json_flags(file_path, flags),
    }
}

fn print_text_flags(file_path: &Path, flags: &[FlaggedWord], colored_output: bool) {
    if flags.is_empty() {
        return;
    }

    let file_name = file_path.display().to_string();

    if colored_output {
        println!("\n{}", file_name.bold().underline());
    } else {
        println!("\n{}", file_name);
    }

    for flag in flags {
        let line_info = format!("{}:{}", flag.line, flag.column);
        let marker = if flag.kind == "doubled-word" {
            " (doubled)"
        } else {
            ""
        };

        if colored_output {
            println!(
                "  {} {}{} {}",
                line_info.blue().bold(),
                flag.word.red().bold(),
                marker.yellow(),
                format_context(&flag.context, &flag.word, colored_output)
            );

            if !flag.suggestions.is_empty() {
                let suggestions = flag
                    .suggestions
                    .iter()
                    .take(5)
                    .map(|s| s.green().to_string())
                    .collect::<Vec<_>>()
                    .join(&", ".dimmed().to_string());
                println!("    {} {}", "→".dimmed(), suggestions);
            }
        } else {
            println!("  {} {}{} {}", line_info, flag.word, marker, flag.context);

            if !flag.suggestions.is_empty() {
                let suggestions = flag
                    .suggestions
                    .iter()
                    .take(5)
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("    → {}", suggestions);
            }
        }
    }
}

fn print_json_flags(file_path: &Path, flags: &[FlaggedWord]) {
    let json_flags: Vec<JsonFlag> = flags
        .iter()
        .map(|f| JsonFlag {
            file: file_path.display().to_string(),
            flag: f.clone(),
        })
        .collect();

    let output = JsonOutput {
        files_checked: 1,
        total_flagged: flags.len(),
        flags: json_flags,
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize report: {}", e),
    }
}

fn format_context(context: &str, word: &str, colored: bool) -> String {
    if colored {
        context.replace(word, &word.red().bold().to_string())
    } else {
        context.to_string()
    }
}

pub fn print_check_summary(total_flagged: usize, files: &[impl AsRef<Path>], colored: bool) {
    println!();
    if total_flagged == 0 {
        if colored {
            println!("{}", "✓ No spelling errors found!".green().bold());
        } else {
            println!("✓ No spelling errors found!");
        }
    } else {
        let flag_word = if total_flagged == 1 { "word" } else { "words" };
        if colored {
            println!(
                "{} {} flagged {} in {} {}",
                "✗".red().bold(),
                total_flagged.to_string().red().bold(),
                flag_word,
                files.len(),
                if files.len() == 1 { "file" } else { "files" }
            );
        } else {
            println!(
                "✗ {} flagged {} in {} {}",
                total_flagged,
                flag_word,
                files.len(),
                if files.len() == 1 { "file" } else { "files" }
            );
        }
    }
}

pub fn print_fix_summary(total_fixed: usize, files: &[impl AsRef<Path>], colored: bool) {
    println!();
    if total_fixed == 0 {
        if colored {
            println!("{}", "No corrections needed!".green().bold());
        } else {
            println!("No corrections needed!");
        }
    } else {
        let fix_word = if total_fixed == 1 {
            "correction"
        } else {
            "corrections"
        };
        if colored {
            println!(
                "{} {} {} applied to {} {}",
                "✓".green().bold(),
                total_fixed.to_string().green().bold(),
                fix_word,
                files.len(),
                if files.len() == 1 { "file" } else { "files" }
            );
        } else {
            println!(
                "✓ {} {} applied to {} {}",
                total_fixed,
                fix_word,
                files.len(),
                if files.len() == 1 { "file" } else { "files" }
            );
        }
    }
}
