//! Parsing of the engine's "could not find a typeface" warnings.

use font_core::{DiagnosticMessage, FontError, FontResult};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::Serialize;

const TYPEFACE_MARKER: &str = "Could not find a typeface";

lazy_static! {
    static ref FAMILY_PATTERN: Regex = Regex::new(r"Could not find a typeface.*font family '([^']+)'").unwrap();
    static ref TEXT_PATTERN: Regex = Regex::new(r"text: '([^']+)'").unwrap();
}

/// A typeface warning reduced to what the repair pass needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedWarning {
    /// Position of the message in the parse log
    pub index: usize,
    pub family: String,
    /// Snippet of the text the engine failed to lay out, when the warning names one
    pub text: Option<String>,
}

impl ParsedWarning {
    /// Snippet equal to, contained in, or containing the block text.
    /// Empty block text never matches.
    pub fn matches_text(&self, block_text: &str) -> bool {
        match self.text.as_deref() {
            Some(snippet) if !block_text.is_empty() => {
                snippet == block_text || block_text.contains(snippet) || snippet.contains(block_text)
            }
            _ => false,
        }
    }
}

/// Does this message claim to be a missing-typeface warning at all?
pub fn is_typeface_warning(message: &DiagnosticMessage) -> bool {
    message.is_warning() && message.text.contains(TYPEFACE_MARKER)
}

pub fn parse_warning(index: usize, message: &DiagnosticMessage) -> FontResult<ParsedWarning> {
    let family = FAMILY_PATTERN
        .captures(&message.text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| FontError::MalformedDiagnostic(message.text.clone()))?;
    let text = TEXT_PATTERN
        .captures(&message.text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Ok(ParsedWarning { index, family, text })
}

/// Typeface warnings in log order, plus the number that could not be parsed
pub fn parse_warnings(messages: &[DiagnosticMessage]) -> (Vec<ParsedWarning>, usize) {
    let mut parsed = Vec::new();
    let mut skipped = 0;
    for (index, message) in messages.iter().enumerate() {
        if !is_typeface_warning(message) {
            continue;
        }
        match parse_warning(index, message) {
            Ok(warning) => parsed.push(warning),
            Err(e) => {
                warn!("[DiagnosticCorrelator] skipping warning #{}: {}", index, e);
                skipped += 1;
            }
        }
    }
    (parsed, skipped)
}

/// Families named by typeface warnings, first occurrence order, no duplicates
pub fn missing_families(messages: &[DiagnosticMessage]) -> Vec<String> {
    let mut families: Vec<String> = Vec::new();
    for warning in parse_warnings(messages).0 {
        if !families.contains(&warning.family) {
            families.push(warning.family);
        }
    }
    families
}

/// (text snippet, family) pairs in log order
pub fn text_font_map(messages: &[DiagnosticMessage]) -> Vec<(String, String)> {
    parse_warnings(messages)
        .0
        .into_iter()
        .filter_map(|w| w.text.map(|text| (text, w.family)))
        .collect()
}
