//! Ground-truth transcript readers.
//!
//! Word transcripts hold `<start> <end> <words...>` lines and only the last
//! line is used. Phone transcripts hold one `<start> <end> <phone>` line per
//! phone.

use std::path::Path;

use crate::error::{PrepError, Result};

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))
}

/// Lowercased words of the last line, without its two leading time offsets.
pub fn read_word_transcript(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let text = read_text(path)?;
    let last = text
        .lines()
        .last()
        .ok_or_else(|| PrepError::EmptyTranscript(path.to_path_buf()))?;
    Ok(parse_word_line(last))
}

/// Phone symbols (last token of every line), space-joined in file order.
pub fn read_phone_transcript(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let text = read_text(path)?;
    Ok(parse_phone_lines(&text))
}

fn parse_word_line(line: &str) -> String {
    line.split_whitespace()
        .skip(2)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_phone_lines(text: &str) -> String {
    text.lines()
        .filter_map(|line| line.split_whitespace().last())
        .collect::<Vec<_>>()
        .join(" ")
}
