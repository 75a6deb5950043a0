use std::sync::Arc;
use regex::Regex;
use lazy_static::lazy_static;
use log::debug;

mod aliases;

pub use aliases::{AliasMap, AliasTables, SubstitutionTable, WeightAliasMap};

/// Turns a raw family string into the ordered list of names to query,
/// most specific first.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    aliases: Arc<AliasTables>,
}

impl NameNormalizer {
    pub fn new(aliases: Arc<AliasTables>) -> Self {
        Self { aliases }
    }

    pub fn tables(&self) -> &AliasTables {
        &self.aliases
    }

    /// Candidate names for `raw`.
    ///
    /// Empty or whitespace-only input yields no candidates. A PDF subset
    /// tag (`ABCDEF+`) is dropped. Otherwise the first candidate is the full
    /// (aliased, decomposed) name and each following one drops one more
    /// trailing word:
    /// `"HelveticaNeueBold"` -> `["Helvetica Neue Bold", "Helvetica Neue", "Helvetica"]`.
    pub fn candidates(&self, raw: &str) -> Vec<String> {
        let without_subset = Self::remove_subset_prefix(raw.trim());
        let trimmed = without_subset.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let mut words = Self::split_words(trimmed);

        // Alias lookup on the name as written, then on its spaced-out form
        let alias = self
            .aliases
            .families
            .get(trimmed)
            .or_else(|| self.aliases.families.get(&words.join(" ")));
        if let Some(alias) = alias {
            debug!("[NameNormalizer] alias \"{}\" -> \"{}\"", trimmed, alias);
            words = Self::split_words(alias);
        }

        match words.len() {
            0 => return Vec::new(),
            1 => return vec![words.remove(0)],
            _ => {}
        }

        (0..words.len())
            .map(|dropped| words[..words.len() - dropped].join(" "))
            .collect()
    }

    /// Cache key for a family: its most specific candidate. Case is kept
    /// because alias and configured lookups are case-sensitive.
    pub fn normalized_family(&self, raw: &str) -> String {
        self.candidates(raw).into_iter().next().unwrap_or_default()
    }

    fn remove_subset_prefix(name: &str) -> std::borrow::Cow<'_, str> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^[A-Z]{6}\+").unwrap();
        }
        RE.replace(name, "")
    }

    /// Split a compound name into words. Hyphens, underscores and whitespace
    /// separate words; so do case changes (`BebasNeue`), the end of an
    /// acronym (`PTSans`) and a letter followed by a digit (`Inter28pt`).
    pub fn split_words(name: &str) -> Vec<String> {
        lazy_static! {
            static ref SEPARATORS: Regex = Regex::new(r"[-_\s]+").unwrap();
        }

        SEPARATORS
            .split(name)
            .filter(|part| !part.is_empty())
            .flat_map(|part| Self::split_camel_case(part).into_iter())
            .collect()
    }

    fn split_camel_case(part: &str) -> Vec<String> {
        let chars: Vec<char> = part.chars().collect();
        let mut words = Vec::new();
        let mut current = String::new();

        for i in 0..chars.len() {
            let c = chars[i];
            if i > 0 {
                let prev = chars[i - 1];
                let next = chars.get(i + 1).copied();
                let boundary = (prev.is_lowercase() && c.is_uppercase())
                    || (prev.is_uppercase() && c.is_uppercase() && next.map_or(false, |n| n.is_lowercase()))
                    || (prev.is_alphabetic() && c.is_ascii_digit());
                if boundary && !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current);
        }
        words
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(AliasTables::builtin()))
    }
}
