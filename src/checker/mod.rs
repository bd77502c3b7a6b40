pub mod tokenizer;

use crate::cli::output::{write_occurrence, OutputFormat};
use crate::speller::{Speller, TypoSet};
use crate::{CheckResult, Config, Occurrence};
use aho_corasick::{AhoCorasick, MatchKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// How typos are located in the file text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Split lines into words and compare whole words.
    #[default]
    Word,
    /// Legacy raw substring search. Known to be wrong: a typo also matches
    /// inside any longer word that contains it, e.g. `io` inside `bufio`.
    Substring,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "word" => Ok(MatchPolicy::Word),
            "substring" => Ok(MatchPolicy::Substring),
            _ => Err(format!("Unknown match policy: {}", s)),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Word => write!(f, "word"),
            MatchPolicy::Substring => write!(f, "substring"),
        }
    }
}

/// A typo set prepared for one match policy.
pub enum Matcher<'a> {
    Word(&'a TypoSet),
    Substring(AhoCorasick),
}

impl<'a> Matcher<'a> {
    pub fn new(typos: &'a TypoSet, policy: MatchPolicy) -> Result<Self> {
        match policy {
            MatchPolicy::Word => Ok(Matcher::Word(typos)),
            MatchPolicy::Substring => {
                let mut patterns: Vec<&str> = typos.iter().collect();
                patterns.sort_unstable();
                let automaton = AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(patterns)
                    .context("Failed to build substring matcher")?;
                Ok(Matcher::Substring(automaton))
            }
        }
    }

    /// Every match in `line`, left to right.
    pub fn find<'l>(&self, line: &'l str) -> Vec<&'l str> {
        match self {
            Matcher::Word(typos) => tokenizer::words(line)
                .filter(|word| typos.contains(word))
                .collect(),
            Matcher::Substring(automaton) => automaton
                .find_iter(line)
                .map(|m| &line[m.start()..m.end()])
                .collect(),
        }
    }
}

/// Report every match in `reader`, numbering lines from 0, and return how
/// many were written.
///
/// A read error stops the scan; reports already written stay written.
pub fn scan<R: BufRead, W: Write>(
    file: &str,
    mut reader: R,
    matcher: &Matcher<'_>,
    format: OutputFormat,
    out: &mut W,
) -> Result<usize> {
    let mut buf = Vec::new();
    let mut line_num = 0;
    let mut reported = 0;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("Problem reading \"{}\"", file))?;
        if n == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        for word in matcher.find(line) {
            write_occurrence(
                out,
                &Occurrence {
                    file,
                    line: line_num,
                    word,
                },
                format,
            )?;
            reported += 1;
        }
        line_num += 1;
    }

    Ok(reported)
}

pub struct SpellChecker {
    speller: Speller,
    policy: MatchPolicy,
    format: OutputFormat,
}

impl SpellChecker {
    pub fn new(config: &Config, format: OutputFormat) -> Result<Self> {
        let speller = Speller::new(config)?;
        if config.match_policy == MatchPolicy::Substring {
            debug!("using the substring match policy; matches inside longer words are reported");
        }

        Ok(Self {
            speller,
            policy: config.match_policy,
            format,
        })
    }

    /// Run the speller on `file_path`, then report where each typo occurs.
    pub fn check<W: Write>(&self, file_path: &Path, out: &mut W) -> Result<CheckResult> {
        let label = file_path.display().to_string();

        File::open(file_path).with_context(|| format!("Could not open \"{}\"", label))?;

        let typos = self
            .speller
            .find_typos(file_path)
            .with_context(|| format!("Could not spell check \"{}\"", label))?;

        let file = File::open(file_path).with_context(|| format!("Could not open \"{}\"", label))?;
        let matcher = Matcher::new(&typos, self.policy)?;
        let occurrences = scan(&label, BufReader::new(file), &matcher, self.format, out)?;
        out.flush()
            .with_context(|| format!("Failed to write results for \"{}\"", label))?;

        info!(
            "{}: {} typo(s), {} occurrence(s)",
            label,
            typos.len(),
            occurrences
        );

        Ok(CheckResult {
            typo_count: typos.len(),
            occurrence_count: occurrences,
        })
    }
}
