use crate::Occurrence;
use colored::*;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `file:line+/word/`, an address acme and sam can jump to.
    #[default]
    Text,
    /// One JSON object per line.
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

pub fn write_occurrence<W: Write>(
    out: &mut W,
    occurrence: &Occurrence<'_>,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(
            out,
            "{}:{}+/{}/",
            occurrence.file, occurrence.line, occurrence.word
        ),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, occurrence).map_err(io::Error::from)?;
            writeln!(out)
        }
    }
}

/// Whether `err` was caused by stdout being closed by the reader.
pub fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .map_or(false, |e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}

/// Describe a failed file on stderr, including its cause chain.
pub fn print_failure(err: &anyhow::Error, colored: bool) {
    if colored {
        eprintln!("{} {:#}", "error:".red().bold(), err);
    } else {
        eprintln!("error: {:#}", err);
    }
}
