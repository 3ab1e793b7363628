// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord sheet classification and transposition.
//!
//! Pasted cifra text is split into lines and each line is classified as a
//! chord line, lyric line, section header or empty line. Chord lines are
//! rewritten token by token with their original spacing intact so chords
//! stay aligned over the lyric below them. Lyric and header lines are never
//! modified.
//!
//! Classification is a majority vote over whitespace tokens. It never fails:
//! a misread line is rendered verbatim rather than dropped.

pub mod blacklist;
pub mod token;

pub use blacklist::WordBlacklist;
pub use token::{classify_token, is_chord_like, transpose_chord, TokenKind};

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::music::Semitones;

/// Classified line type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Chord,
    Lyric,
    Header,
    Empty,
}

/// One line of a rendered chord sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// Stable id within one render (`line-<n>`)
    pub id: String,
    /// Line classification
    #[serde(rename = "type")]
    pub line_type: LineType,
    /// Line text; transposed for chord lines, delimiters stripped for headers
    pub content: String,
}

/// Classifier holding the active chord-shaped word list
#[derive(Debug, Clone, Default)]
pub struct Transposer {
    blacklist: WordBlacklist,
}

impl Transposer {
    /// Create a transposer with a custom blacklist
    pub fn new(blacklist: WordBlacklist) -> Self {
        Self { blacklist }
    }

    /// Get the blacklist in use
    pub fn blacklist(&self) -> &WordBlacklist {
        &self.blacklist
    }

    /// Classify every line of `content` and transpose chord lines by `semitones`.
    pub fn classify_and_transpose(&self, content: &str, semitones: Semitones) -> Vec<ParsedLine> {
        content
            .split('\n')
            .enumerate()
            .map(|(index, line)| {
                let (line_type, content) = self.classify_line(line, semitones);
                ParsedLine {
                    id: format!("line-{}", index),
                    line_type,
                    content,
                }
            })
            .collect()
    }

    /// Classify a single source line.
    pub fn classify_line(&self, line: &str, semitones: Semitones) -> (LineType, String) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return (LineType::Empty, line.to_string());
        }

        if let Some(title) = header_title(trimmed) {
            return (LineType::Header, title.to_string());
        }

        if self.is_chord_line(line) {
            (LineType::Chord, self.transpose_line(line, semitones))
        } else {
            (LineType::Lyric, line.to_string())
        }
    }

    /// Majority vote: all tokens chords, or more chords than words.
    pub fn is_chord_line(&self, line: &str) -> bool {
        let (chords, words) = line
            .split_whitespace()
            .fold((0usize, 0usize), |(chords, words), token| {
                match classify_token(token, &self.blacklist) {
                    TokenKind::Chord => (chords + 1, words),
                    TokenKind::Word => (chords, words + 1),
                }
            });

        (chords > 0 && words == 0) || chords > words
    }

    /// Transpose the chord tokens of a line, keeping every whitespace run.
    pub fn transpose_line(&self, line: &str, semitones: Semitones) -> String {
        let mut out = String::with_capacity(line.len() + 8);
        for segment in split_keep_whitespace(line) {
            let is_space = segment.chars().next().is_some_and(char::is_whitespace);
            if !is_space && classify_token(segment, &self.blacklist) == TokenKind::Chord {
                out.push_str(&transpose_chord(segment, semitones));
            } else {
                out.push_str(segment);
            }
        }
        out
    }
}

/// Classify and transpose with the built-in blacklist.
pub fn classify_and_transpose(content: &str, semitones: Semitones) -> Vec<ParsedLine> {
    static DEFAULT: OnceLock<Transposer> = OnceLock::new();
    DEFAULT
        .get_or_init(Transposer::default)
        .classify_and_transpose(content, semitones)
}

/// Join rendered lines back into text.
pub fn join_lines(lines: &[ParsedLine]) -> String {
    lines
        .iter()
        .map(|line| line.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header title for `[Name]` or `Name:` lines (already trimmed).
fn header_title(trimmed: &str) -> Option<&str> {
    if let Some(inner) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        if !inner.contains(['[', ']']) {
            return Some(inner.trim());
        }
    }

    trimmed.strip_suffix(':').map(str::trim)
}

/// Split into alternating runs of whitespace and non-whitespace.
fn split_keep_whitespace(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (i, c) in line.char_indices() {
        let space = c.is_whitespace();
        match in_space {
            Some(previous) if previous != space => {
                segments.push(&line[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(space);
    }

    if start < line.len() {
        segments.push(&line[start..]);
    }
    segments
}
