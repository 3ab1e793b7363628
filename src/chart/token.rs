// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord token validation and transposition.
//!
//! A token is "chord-like" when it starts with a note letter, an optional
//! accidental, and then nothing but digits, quality markers (`maj`, `min`,
//! `m`, `M`, `dim`, `aug`, `sus`, `add`, `alt`), accidentals and the symbols
//! `( ) [ ] / + - ^ º °`. A further note letter is only allowed directly
//! after `/`, as the bass note.
//!
//! Transposition only touches the root (first note letter, optionally
//! behind open brackets) and bass notes (a note letter right after `/`).
//! Everything else in the token is copied through untouched, so suffixes
//! like `m7(b5)` survive.

use crate::music::note::{is_accidental, is_note_letter};
use crate::music::{Note, Semitones};

use super::blacklist::WordBlacklist;

/// Quality markers, longest first so `maj` wins over `m`
const QUALITY_MARKERS: [&str; 9] = ["maj", "min", "dim", "aug", "sus", "add", "alt", "m", "M"];

/// Symbols allowed anywhere after the root
const SUFFIX_SYMBOLS: [char; 10] = ['(', ')', '[', ']', '/', '+', '-', '^', 'º', '°'];

/// Trailing punctuation ignored during validation
const TRAILING_PUNCTUATION: [char; 8] = [')', ']', '.', ',', ';', ':', '!', '?'];

/// How a single whitespace-delimited token was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A chord symbol that will be transposed
    Chord,
    /// Anything else, including blacklisted chord-shaped words
    Word,
}

/// Strip leading `(`/`[` and trailing brackets/punctuation for validation.
pub fn strip_for_validation(token: &str) -> &str {
    token
        .trim_start_matches(['(', '['])
        .trim_end_matches(TRAILING_PUNCTUATION)
}

/// Check a (stripped) token against the chord shape.
pub fn is_chord_like(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(c) if is_note_letter(c) => {}
        _ => return false,
    }

    let mut remaining = chars.as_str();
    if let Some(c) = remaining.chars().next() {
        if is_accidental(c) {
            remaining = &remaining[c.len_utf8()..];
        }
    }

    let mut after_slash = false;
    while let Some(c) = remaining.chars().next() {
        if is_note_letter(c) {
            if !after_slash {
                return false;
            }
            remaining = &remaining[c.len_utf8()..];
            after_slash = false;
            continue;
        }

        if let Some(marker) = QUALITY_MARKERS.iter().find(|m| remaining.starts_with(*m)) {
            remaining = &remaining[marker.len()..];
            after_slash = false;
            continue;
        }

        if c.is_ascii_digit() || is_accidental(c) || SUFFIX_SYMBOLS.contains(&c) {
            remaining = &remaining[c.len_utf8()..];
            after_slash = c == '/';
        } else {
            return false;
        }
    }

    true
}

/// Classify a raw token (surrounding punctuation allowed).
pub fn classify_token(token: &str, blacklist: &WordBlacklist) -> TokenKind {
    let stripped = strip_for_validation(token);
    if is_chord_like(stripped) && !blacklist.contains(stripped) {
        TokenKind::Chord
    } else {
        TokenKind::Word
    }
}

/// Transpose the root and bass notes of a chord token by `semitones`.
///
/// Output notes are always sharp-spelled. Note letters that are neither
/// the root nor directly after a `/` are copied as-is.
pub fn transpose_chord(token: &str, semitones: Semitones) -> String {
    let chars: Vec<char> = token.chars().collect();
    let mut out = String::with_capacity(token.len() + 4);
    let mut before_root = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if is_note_letter(c) && (before_root || (i > 0 && chars[i - 1] == '/')) {
            let has_accidental = chars.get(i + 1).is_some_and(|&next| is_accidental(next));
            let end = if has_accidental { i + 2 } else { i + 1 };
            let spelling: String = chars[i..end].iter().collect();

            if let Some(note) = Note::parse(&spelling) {
                out.push_str(note.transpose(semitones).sharp_name());
                before_root = false;
                i = end;
                continue;
            }
        }

        if !matches!(c, '(' | '[') {
            before_root = false;
        }
        out.push(c);
        i += 1;
    }

    out
}
