use regex::Regex;
use std::collections::HashSet;
use std::io::{self, BufRead};

/// The misspelled tokens the external speller reported for one file.
///
/// Membership is case-sensitive and never includes the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypoSet {
    words: HashSet<String>,
}

impl TypoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw output line. Surrounding whitespace is stripped and
    /// blank lines are dropped. Returns whether the set grew.
    pub fn insert(&mut self, raw: &str) -> bool {
        let word = trim(raw);
        if word.is_empty() {
            return false;
        }
        self.words.insert(word.to_string())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Drop every typo matched by one of `patterns`.
    pub fn retain_unignored(&mut self, patterns: &[Regex]) {
        if patterns.is_empty() {
            return;
        }
        self.words
            .retain(|word| !patterns.iter().any(|pattern| pattern.is_match(word)));
    }
}

impl<S: AsRef<str>> FromIterator<S> for TypoSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TypoSet::new();
        for word in iter {
            set.insert(word.as_ref());
        }
        set
    }
}

fn trim(s: &str) -> &str {
    s.trim()
}

/// Read speller output until end-of-stream, one typo per line.
///
/// A final line without a terminator still counts. Any read error fails the
/// whole collection; callers never see a partially filled set.
pub fn collect<R: BufRead>(mut reader: R) -> io::Result<TypoSet> {
    let mut typos = TypoSet::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        typos.insert(&String::from_utf8_lossy(&buf));
    }

    Ok(typos)
}
