//! Static lookup tables shared by the resolver and the repair pass.
//!
//! All three tables are built once per session and only read afterwards.
//! Overrides from [`ResolverConfig`] are layered over the built-in entries.

use std::collections::HashMap;
use font_core::{CanonicalWeight, ResolverConfig, WeightToken};

/// Family alias -> canonical family. Keys match exactly (case-sensitive).
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl AliasMap {
    pub fn builtin() -> Self {
        let entries = [
            ("Helvetica", "Roboto"),
            ("Times New Roman", "Tinos"),
            ("Arial", "Arimo"),
            ("Georgia", "Tinos"),
            ("Garamond", "EB Garamond"),
            ("Futura", "Raleway"),
            ("Comic Sans MS", "Comic Neue"),
        ];
        Self {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, family: impl Into<String>) {
        self.entries.insert(alias.into(), family.into());
    }

    pub fn get(&self, family: &str) -> Option<&str> {
        self.entries.get(family).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Weight token (numeric string, number or keyword) -> canonical weight.
/// Keyword lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct WeightAliasMap {
    entries: HashMap<String, CanonicalWeight>,
}

impl WeightAliasMap {
    pub fn builtin() -> Self {
        use CanonicalWeight::*;

        let entries = [
            ("100", Thin),
            ("thin", Thin),
            ("hairline", Thin),
            ("200", ExtraLight),
            ("extralight", ExtraLight),
            ("extra-light", ExtraLight),
            ("ultralight", ExtraLight),
            ("300", Light),
            ("light", Light),
            ("400", Normal),
            ("normal", Normal),
            ("regular", Normal),
            ("book", Normal),
            ("500", Medium),
            ("medium", Medium),
            ("600", SemiBold),
            ("semibold", SemiBold),
            ("semi-bold", SemiBold),
            ("demibold", SemiBold),
            ("700", Bold),
            ("bold", Bold),
            ("800", ExtraBold),
            ("extrabold", ExtraBold),
            ("extra-bold", ExtraBold),
            ("ultrabold", ExtraBold),
            ("900", Heavy),
            ("heavy", Heavy),
            ("black", Heavy),
        ];
        Self {
            entries: entries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    /// Canonicalize a raw token. Unknown keywords yield `None`; numbers that
    /// are not an exact hundred are bucketed to the nearest one.
    pub fn canonicalize(&self, token: &WeightToken) -> Option<CanonicalWeight> {
        match token {
            WeightToken::Number(n) => Some(CanonicalWeight::from_numeric(*n)),
            WeightToken::Text(text) => self.canonicalize_str(text),
        }
    }

    pub fn canonicalize_str(&self, token: &str) -> Option<CanonicalWeight> {
        let key = token.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        if let Some(weight) = self.entries.get(&key) {
            return Some(*weight);
        }
        key.parse::<u32>().ok().map(CanonicalWeight::from_numeric)
    }

    /// Is this token something the table recognises at all?
    pub fn recognises(&self, token: &WeightToken) -> bool {
        self.canonicalize(token).is_some()
    }
}

impl Default for WeightAliasMap {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Unavailable vendor family -> available replacement family
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
    entries: HashMap<String, String>,
}

impl SubstitutionTable {
    pub fn builtin() -> Self {
        let entries = [
            ("Source Sans Pro", "Open Sans"),
            ("Source Serif Pro", "Source Serif 4"),
            ("Proxima Nova", "Nunito Sans"),
            ("Futura", "Nunito Sans"),
            ("Avenir", "Nunito Sans"),
            ("Helvetica Neue", "Inter"),
            ("Brandon Grotesque", "Nunito Sans"),
            ("Minion Pro", "Source Serif 4"),
            ("Myriad Pro", "Open Sans"),
            ("Adobe Garamond Pro", "EB Garamond"),
            ("Trajan Pro", "Cinzel"),
            ("Gotham", "Nunito Sans"),
            ("Helvetica", "Inter"),
            ("Times", "Source Serif 4"),
            ("Arial", "Open Sans"),
            ("AvianoSansThin", "Aviano Sans Thin"),
            ("AvianoSansBold", "Aviano Sans Bold"),
            ("AvianoSans", "Aviano Sans Light"),
            ("AvianoSansLight", "Aviano Sans Light"),
            ("AvianoSansBlack", "Aviano Sans Black"),
            ("Aviano Sans Thin", "Aviano Sans Thin"),
            ("Aviano Sans Bold", "Aviano Sans Bold"),
            ("Aviano Sans Light", "Aviano Sans Light"),
            ("Aviano Sans Black", "Aviano Sans Black"),
            ("Aviano Sans Regular", "Aviano Sans Light"),
            ("Aviano Sans", "Aviano Sans Light"),
            ("Inter28pt", "Inter 28pt"),
            ("Inter", "Inter"),
            ("Inter 28pt", "Inter 28pt"),
            ("Inter 24pt", "Inter 24pt"),
            ("BebasNeue", "BebasNeue Regular"),
            ("Bebas Neue", "BebasNeue Regular"),
            ("Montserrat", "Montserrat Regular"),
        ];
        Self {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, family: impl Into<String>, replacement: impl Into<String>) {
        self.entries.insert(family.into(), replacement.into());
    }

    pub fn get(&self, family: &str) -> Option<&str> {
        self.entries.get(family).map(String::as_str)
    }

    /// Replacement for `family`, or `family` itself when there is no entry
    pub fn substitute<'a>(&'a self, family: &'a str) -> &'a str {
        self.get(family).unwrap_or(family)
    }
}

/// The three tables, constructed once and shared read-only
#[derive(Debug, Clone, Default)]
pub struct AliasTables {
    pub families: AliasMap,
    pub weights: WeightAliasMap,
    pub substitutions: SubstitutionTable,
}

impl AliasTables {
    pub fn builtin() -> Self {
        Self {
            families: AliasMap::builtin(),
            weights: WeightAliasMap::builtin(),
            substitutions: SubstitutionTable::builtin(),
        }
    }

    /// Built-in tables with the config's overrides layered on top
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut tables = Self::builtin();
        for (alias, family) in &config.family_aliases {
            tables.families.insert(alias.clone(), family.clone());
        }
        for (family, replacement) in &config.substitutions {
            tables.substitutions.insert(family.clone(), replacement.clone());
        }
        tables
    }
}
