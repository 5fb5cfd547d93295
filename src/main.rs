use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use spellmark::backend::process::{ProcessBulk, ProcessTransport};
use spellmark::cli::output::{self, FlaggedWord, OutputFormat};
use spellmark::engine::CorrectionChoice;
use spellmark::host::StringHost;
use spellmark::{AnnotationKind, CheckVerdict, Engine, EngineConfig, Host, Span};
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spellmark")]
#[command(version, about = "Incremental spell annotations over ispell-compatible backends", long_about = None)]
struct Cli {
    /// Files to check
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Check a single word and print its verdict
    #[arg(short, long)]
    word: Option<String>,

    /// Fix misspellings in place (auto-apply top candidate)
    #[arg(short, long)]
    fix: bool,

    /// Interactive mode for selecting corrections
    #[arg(short, long, requires = "fix")]
    interactive: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if flagged words are found
    #[arg(long)]
    no_fail: bool,

    /// Language/dictionary to use (e.g., en_US, en_GB)
    #[arg(short, long)]
    language: Option<String>,

    /// Backend program spoken over the ispell protocol (aspell, hunspell)
    #[arg(short, long)]
    backend: Option<String>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Personal dictionary file
    #[arg(long)]
    personal_dict: Option<PathBuf>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "spellmark", &mut io::stdout());
        return Ok(());
    }

    // Load configuration
    let mut config = EngineConfig::load(cli.language.clone(), cli.personal_dict.clone())?;
    if let Some(backend) = cli.backend.clone() {
        config.backend_program = backend;
    }

    if let Some(word) = &cli.word {
        return check_single_word(&config, word, !cli.no_color, cli.no_fail);
    }

    if cli.files.is_empty() {
        anyhow::bail!("No files specified. Use --help for usage information.");
    }

    let mut total_flagged = 0;
    let mut total_fixed = 0;

    for file_path in &cli.files {
        if !file_path.exists() {
            eprintln!("Error: File not found: {}", file_path.display());
            continue;
        }

        let text = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;

        // One engine per file: annotations and session state are
        // buffer-local.
        let mut engine = connect(&config)?;
        let mut host = StringHost::new(text);
        engine.check_buffer(&mut host)?;

        if cli.fix {
            let fixed = fix_file(&mut engine, &mut host, cli.interactive, !cli.no_color)?;
            if fixed > 0 {
                fs::write(file_path, host.buffer.as_bytes())
                    .with_context(|| format!("Failed to write {}", file_path.display()))?;
            }
            total_fixed += fixed;
        } else {
            let flags = collect_flags(&mut engine, &mut host)?;
            total_flagged += flags.len();
            output::print_flags(file_path, &flags, !cli.no_color, &cli.format);
        }

        for message in &host.notifications {
            eprintln!("{}: {}", file_path.display(), message);
        }
    }

    if cli.fix {
        output::print_fix_summary(total_fixed, &cli.files, !cli.no_color);
    } else {
        output::print_check_summary(total_flagged, &cli.files, !cli.no_color);
    }

    if total_flagged > 0 && !cli.no_fail && !cli.fix {
        std::process::exit(1);
    }

    Ok(())
}

fn connect(config: &EngineConfig) -> Result<Engine<ProcessTransport>> {
    let transport = ProcessTransport::spawn(config)?;
    Ok(Engine::new(config.clone(), transport).with_bulk(Box::new(ProcessBulk::new(config))))
}

fn check_single_word(config: &EngineConfig, word: &str, colored: bool, no_fail: bool) -> Result<()> {
    let mut engine = connect(config)?;
    match engine.query(word)? {
        Some(CheckVerdict::Misspelled { candidates, .. }) => {
            if colored {
                println!("{} {}", "✗".red().bold(), word.red().bold());
            } else {
                println!("✗ {}", word);
            }
            if !candidates.is_empty() {
                println!("  → {}", candidates.join(", "));
            }
            if !no_fail {
                std::process::exit(1);
            }
        }
        _ => {
            if colored {
                println!("{} {}", "✓".green().bold(), word.green());
            } else {
                println!("✓ {}", word);
            }
        }
    }
    Ok(())
}

/// Gather the report entries for everything flagged in the buffer,
/// re-querying the backend for correction candidates.
fn collect_flags(
    engine: &mut Engine<ProcessTransport>,
    host: &mut StringHost,
) -> Result<Vec<FlaggedWord>> {
    let flagged: Vec<(Span, AnnotationKind)> =
        engine.annotations.iter().map(|a| (a.span, a.kind)).collect();

    let mut flags = Vec::with_capacity(flagged.len());
    for (span, kind) in flagged {
        let suggestions = match kind {
            AnnotationKind::Misspelled => engine.candidates_at(host, span.end)?,
            AnnotationKind::Doublon => Vec::new(),
        };
        flags.push(FlaggedWord::from_span(&host.buffer, span, kind, suggestions));
    }
    Ok(flags)
}

/// Walk the flagged words in buffer order, applying corrections. Doubled
/// words are reported only; the buffer is never rewritten for them.
fn fix_file(
    engine: &mut Engine<ProcessTransport>,
    host: &mut StringHost,
    interactive: bool,
    colored: bool,
) -> Result<usize> {
    let mut fixed = 0;
    let mut pos = 0;

    loop {
        let next = engine
            .annotations
            .iter()
            .find(|a| a.span.start >= pos)
            .map(|a| (a.span, a.kind));
        let Some((span, kind)) = next else {
            break;
        };
        pos = span.start + 1;

        if kind == AnnotationKind::Doublon {
            continue;
        }

        let candidates = engine.candidates_at(host, span.end)?;
        if candidates.is_empty() {
            continue;
        }

        let choice = if interactive {
            let flag = FlaggedWord::from_span(&host.buffer, span, kind, candidates.clone());
            prompt_choice(&flag, &candidates, colored)?
        } else {
            Some(CorrectionChoice::Candidate(candidates[0].clone()))
        };

        if let Some(choice) = choice {
            let applied = matches!(choice, CorrectionChoice::Candidate(_));
            host.move_point(span.end);
            engine.correct_word_with(host, choice)?;
            if applied {
                fixed += 1;
            }
        }
    }

    Ok(fixed)
}

fn prompt_choice(
    flag: &FlaggedWord,
    candidates: &[String],
    colored: bool,
) -> Result<Option<CorrectionChoice>> {
    if colored {
        println!(
            "\n{} {}:{}",
            "Misspelling found:".yellow().bold(),
            flag.line.to_string().blue(),
            flag.column.to_string().blue()
        );
        println!("  {}", flag.context.replace(&flag.word, &flag.word.red().bold().to_string()));
    } else {
        println!("\nMisspelling found: {}:{}", flag.line, flag.column);
        println!("  {}", flag.context);
    }

    let shown = candidates.len().min(9);
    let mut items: Vec<String> = candidates[..shown].to_vec();
    items.push("Skip".to_string());
    items.push("Save to personal dictionary".to_string());
    items.push("Accept for this file".to_string());

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Correction for \"{}\"", flag.word))
        .items(&items)
        .default(0)
        .interact_opt()
        .context("Failed to read selection")?;

    Ok(match selection {
        Some(i) if i < shown => Some(CorrectionChoice::Candidate(items[i].clone())),
        Some(i) if i == shown + 1 => Some(CorrectionChoice::SaveToPersonalDict),
        Some(i) if i == shown + 2 => Some(CorrectionChoice::AcceptBuffer),
        _ => None,
    })
}
