pub mod checker;
pub mod cli;
pub mod config;
pub mod speller;

pub use checker::SpellChecker;
pub use config::Config;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckResult {
    pub typo_count: usize,
    pub occurrence_count: usize,
}

/// One place a typo was found. Lines are numbered from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence<'a> {
    pub file: &'a str,
    pub line: usize,
    pub word: &'a str,
}
