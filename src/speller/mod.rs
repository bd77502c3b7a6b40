pub mod pipeline;
pub mod typos;

use crate::Config;
use anyhow::Result;
use pipeline::{Pipeline, PipelineError, StageError};
use regex::Regex;
use std::io::{self, BufReader};
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

pub use typos::TypoSet;

/// Why the typos of a file could not be determined. Distinct from finding
/// none at all.
#[derive(Debug, Error)]
pub enum SpellerError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("problem reading speller output")]
    Read(#[source] io::Error),

    #[error("problems running the speller: {}", join_failures(.0))]
    Stages(Vec<StageError>),
}

fn join_failures(failures: &[StageError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    fn parse(argv: &[String], what: &str) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("No {} command configured", what))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command(&self, file: Option<&Path>) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(file) = file {
            command.arg(file);
        }
        command
    }
}

/// Runs the external speller, through the markup stripper when the file
/// extension asks for it.
#[derive(Debug, Clone)]
pub struct Speller {
    speller: CommandLine,
    delatex: CommandLine,
    markup_extensions: Vec<String>,
    ignore_patterns: Vec<Regex>,
}

impl Speller {
    pub fn new(config: &Config) -> Result<Self> {
        let speller = CommandLine::parse(&config.speller, "speller")?;
        let delatex = CommandLine::parse(&config.delatex, "delatex")?;

        let markup_extensions = config
            .markup_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect();

        let mut ignore_patterns = Vec::new();
        for pattern in &config.ignore_patterns {
            match Regex::new(pattern) {
                Ok(re) => ignore_patterns.push(re),
                Err(e) => warn!("Invalid ignore pattern '{}': {}", pattern, e),
            }
        }

        Ok(Self {
            speller,
            delatex,
            markup_extensions,
            ignore_patterns,
        })
    }

    pub fn needs_delatex(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| self.markup_extensions.iter().any(|m| m == ext))
    }

    pub fn pipeline(&self, path: &Path) -> Pipeline {
        if self.needs_delatex(path) {
            Pipeline::new()
                .stage(self.delatex.command(Some(path)))
                .stage(self.speller.command(None))
        } else {
            Pipeline::new().stage(self.speller.command(Some(path)))
        }
    }

    /// Collect the typos the speller reports for `path`.
    ///
    /// The set is only returned once every stage has exited successfully and
    /// its output has been read to the end.
    pub fn find_typos(&self, path: &Path) -> Result<TypoSet, SpellerError> {
        let pipeline = self.pipeline(path);
        debug!(
            "checking {} with {} stage(s)",
            path.display(),
            pipeline.len()
        );

        let mut running = pipeline.spawn()?;
        let stdout = running.stdout().ok_or_else(|| PipelineError::Pipe {
            program: self.speller.program.clone(),
        })?;
        let mut typos = typos::collect(BufReader::new(stdout)).map_err(SpellerError::Read)?;
        running.wait().map_err(SpellerError::Stages)?;

        typos.retain_unignored(&self.ignore_patterns);
        debug!("{} typo(s) reported for {}", typos.len(), path.display());
        Ok(typos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(speller: &[&str], delatex: &[&str]) -> Config {
        Config {
            speller: speller.iter().map(|s| s.to_string()).collect(),
            delatex: delatex.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_markup_detection() {
        let speller = Speller::new(&Config::default()).unwrap();
        assert!(speller.needs_delatex(Path::new("paper.tex")));
        assert!(speller.needs_delatex(Path::new("dir/paper.tex")));
        assert!(!speller.needs_delatex(Path::new("paper.txt")));
        assert!(!speller.needs_delatex(Path::new("paper.TEX")));
        assert!(!speller.needs_delatex(Path::new("tex")));
    }

    #[test]
    fn test_dotted_extensions_are_normalized() {
        let speller = Speller::new(&Config {
            markup_extensions: vec![".ltx".to_string()],
            ..Default::default()
        })
        .unwrap();
        assert!(speller.needs_delatex(Path::new("paper.ltx")));
    }

    #[test]
    fn test_pipeline_shape() {
        let speller = Speller::new(&Config::default()).unwrap();
        assert_eq!(speller.pipeline(Path::new("a.tex")).len(), 2);
        assert_eq!(speller.pipeline(Path::new("a.txt")).len(), 1);
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let err = Speller::new(&config(&[], &["cat"])).unwrap_err();
        assert_eq!(err.to_string(), "No speller command configured");
    }

    #[test]
    fn test_invalid_ignore_pattern_is_skipped() {
        let speller = Speller::new(&Config {
            ignore_patterns: vec!["(".to_string(), "^x$".to_string()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(speller.ignore_patterns.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_typos_direct() {
        let speller =
            Speller::new(&config(&["sh", "-c", "printf 'teh\\nfrgo'"], &["cat"])).unwrap();
        let typos = speller.find_typos(Path::new("notes.txt")).unwrap();
        assert_eq!(typos.len(), 2);
        assert!(typos.contains("teh"));
        assert!(typos.contains("frgo"));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_typos_through_delatex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.tex");
        std::fs::write(&path, "\\emph{frgo} is wrong\n").unwrap();

        let speller = Speller::new(&config(&["grep", "-o", "frgo"], &["cat"])).unwrap();
        let typos = speller.find_typos(&path).unwrap();
        assert_eq!(typos.len(), 1);
        assert!(typos.contains("frgo"));
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_failure_is_not_an_empty_set() {
        let speller = Speller::new(&config(&["/nonexistent/spelladdr-speller"], &["cat"])).unwrap();
        let err = speller.find_typos(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(
            err,
            SpellerError::Pipeline(PipelineError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_discards_output() {
        let speller =
            Speller::new(&config(&["sh", "-c", "echo teh; exit 2"], &["cat"])).unwrap();
        let err = speller.find_typos(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, SpellerError::Stages(ref f) if f.len() == 1));
        assert!(err.to_string().starts_with("problems running the speller: `sh` exited with"));
    }

    #[cfg(unix)]
    #[test]
    fn test_ignore_patterns_filter_typos() {
        let speller = Speller::new(&Config {
            speller: vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf 'teh\\nACME\\n'".to_string(),
            ],
            ignore_patterns: vec![r"^[A-Z]+$".to_string()],
            ..Default::default()
        })
        .unwrap();
        let typos = speller.find_typos(Path::new("notes.txt")).unwrap();
        assert_eq!(typos.len(), 1);
        assert!(typos.contains("teh"));
    }
}
