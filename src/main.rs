use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use spelladdr::checker::MatchPolicy;
use spelladdr::cli::output::{is_broken_pipe, print_failure, OutputFormat};
use spelladdr::config::Overrides;
use spelladdr::{Config, SpellChecker};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{debug, info, Level};

#[derive(Parser, Debug)]
#[command(name = "spelladdr")]
#[command(
    version,
    about = "Print editor addresses of the words an external spell checker flags",
    long_about = None
)]
struct Cli {
    /// Files to check
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Spell checker command, split on whitespace; the file is appended
    #[arg(long, value_name = "CMD", env = "SPELLADDR_SPELLER")]
    speller: Option<String>,

    /// Command converting markup files to plain text before spell checking
    #[arg(long, value_name = "CMD", env = "SPELLADDR_DELATEX")]
    delatex: Option<String>,

    /// How typos are located (word, substring); substring also matches inside longer words
    #[arg(long = "match", value_name = "POLICY")]
    match_policy: Option<MatchPolicy>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Configuration file to use instead of the global and local ones
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored diagnostics
    #[arg(long)]
    no_color: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let colored = !cli.no_color && console::Term::stderr().is_term();

    init_logging(cli.verbose, colored);

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "spelladdr", &mut io::stdout());
        return Ok(());
    }

    if cli.files.is_empty() {
        eprintln!("I need the names of files to check.");
        std::process::exit(1);
    }

    let config = Config::load(Overrides {
        config_file: cli.config.clone(),
        speller: cli.speller.clone(),
        delatex: cli.delatex.clone(),
        match_policy: cli.match_policy,
    })?;

    let checker = SpellChecker::new(&config, cli.format)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut failed = 0;
    let mut total_typos = 0;
    let mut total_occurrences = 0;

    // Per-file failures are reported and never change the exit status.
    for file_path in &cli.files {
        match checker.check(file_path, &mut out) {
            Ok(result) => {
                total_typos += result.typo_count;
                total_occurrences += result.occurrence_count;
            }
            Err(err) if is_broken_pipe(&err) => {
                debug!("stdout closed, stopping");
                return Ok(());
            }
            Err(err) => {
                failed += 1;
                print_failure(&err, colored);
            }
        }
    }

    info!(
        "{} typo(s), {} occurrence(s) in {} file(s), {} failed",
        total_typos,
        total_occurrences,
        cli.files.len(),
        failed
    );

    Ok(())
}

fn init_logging(verbose: u8, colored: bool) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(colored)
        .with_target(false)
        .init();
}
