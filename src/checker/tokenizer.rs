// Word splitting for the word-boundary match policy.

use unic_ucd_category::GeneralCategory;

/// Everything except letters (general category L) and `.` separates words.
pub fn is_word_sep(c: char) -> bool {
    c != '.' && !GeneralCategory::of(c).is_letter()
}

/// The non-empty runs of non-separator characters in `line`.
pub fn words(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_word_sep).filter(|word| !word.is_empty())
}
