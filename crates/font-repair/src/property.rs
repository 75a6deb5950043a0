//! Typed access to engine block properties.
//!
//! The kind of a property is decided up front from its path by a rule
//! table, and exactly one typed getter is called for it.

use font_core::{FontError, FontResult};
use serde::{Deserialize, Serialize};

use crate::{BlockId, BlockStore};

pub const TEXT_PATH: &str = "text/text";
pub const TYPEFACE_PATH: &str = "text/typeface";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Number,
    Bool,
    Color,
    Unsupported,
}

/// RGBA, each channel in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Bool(bool),
    Color(Color),
    Unsupported,
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Number(_) => PropertyKind::Number,
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Color(_) => PropertyKind::Color,
            PropertyValue::Unsupported => PropertyKind::Unsupported,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Typed getters of a property store. A getter returns `None` when the
/// block has no value of that type at `path`.
pub trait PropertySource {
    fn block_ids(&self) -> Vec<BlockId>;

    fn get_string(&self, block: BlockId, path: &str) -> Option<String>;

    fn get_number(&self, block: BlockId, path: &str) -> Option<f64>;

    fn get_bool(&self, block: BlockId, path: &str) -> Option<bool>;

    fn get_color(&self, block: BlockId, path: &str) -> Option<Color>;

    fn set_string(&mut self, block: BlockId, path: &str, value: &str) -> FontResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRule {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl PathRule {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Exact(p) => path == p,
            PathRule::Prefix(p) => path.starts_with(p.as_str()),
            PathRule::Suffix(p) => path.ends_with(p.as_str()),
            PathRule::Contains(p) => path.contains(p.as_str()),
        }
    }
}

/// Ordered (rule, kind) pairs; the first matching rule decides
#[derive(Debug, Clone)]
pub struct PropertyRules {
    rules: Vec<(PathRule, PropertyKind)>,
}

impl PropertyRules {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn builtin() -> Self {
        use PathRule::{Contains, Exact, Prefix, Suffix};
        use PropertyKind as K;

        let exact = |p: &str| Exact(p.to_string());
        let rules = vec![
            (Contains("color".into()), K::Color),
            (Suffix("/enabled".into()), K::Bool),
            (exact("visible"), K::Bool),
            (exact("clipped"), K::Bool),
            (exact("dropShadow/clip"), K::Bool),
            (exact("text/clipLinesOutsideOfFrame"), K::Bool),
            (exact("text/automaticFontSizeEnabled"), K::Bool),
            (exact("text/hasClippedLines"), K::Bool),
            (Suffix("/mode".into()), K::String),
            (Suffix("Alignment".into()), K::String),
            (exact("stroke/style"), K::String),
            (exact("stroke/position"), K::String),
            (exact(TEXT_PATH), K::String),
            (exact(TYPEFACE_PATH), K::String),
            (exact("text/fontFamily"), K::String),
            (Suffix("Uri".into()), K::String),
            (Suffix("URI".into()), K::String),
            (exact("width"), K::Number),
            (exact("height"), K::Number),
            (exact("opacity"), K::Number),
            (exact("rotation"), K::Number),
            (exact("position/x"), K::Number),
            (exact("position/y"), K::Number),
            (exact("stroke/width"), K::Number),
            (exact("text/fontSize"), K::Number),
            (exact("text/lineHeight"), K::Number),
            (exact("text/letterSpacing"), K::Number),
            (Prefix("dropShadow/offset/".into()), K::Number),
            (Prefix("dropShadow/blurRadius/".into()), K::Number),
        ];
        Self { rules }
    }

    /// Rules pushed later are consulted after the existing ones
    pub fn push(&mut self, rule: PathRule, kind: PropertyKind) {
        self.rules.push((rule, kind));
    }

    pub fn classify(&self, path: &str) -> PropertyKind {
        self.rules
            .iter()
            .find(|(rule, _)| rule.matches(path))
            .map_or(PropertyKind::Unsupported, |(_, kind)| *kind)
    }

    /// Read `path` with the getter its kind selects. Unclassified paths
    /// yield `Unsupported`; a classified path without a value is an error.
    pub fn read<S: PropertySource + ?Sized>(&self, source: &S, block: BlockId, path: &str) -> FontResult<PropertyValue> {
        let kind = self.classify(path);
        let value = match kind {
            PropertyKind::String => source.get_string(block, path).map(PropertyValue::String),
            PropertyKind::Number => source.get_number(block, path).map(PropertyValue::Number),
            PropertyKind::Bool => source.get_bool(block, path).map(PropertyValue::Bool),
            PropertyKind::Color => source.get_color(block, path).map(PropertyValue::Color),
            PropertyKind::Unsupported => return Ok(PropertyValue::Unsupported),
        };
        value.ok_or_else(|| FontError::Document(format!("block {} has no {:?} value at \"{}\"", block, kind, path)))
    }
}

impl Default for PropertyRules {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Exposes any property source as a [`BlockStore`] through the text and
/// typeface paths.
pub struct PropertyBlocks<S> {
    source: S,
    rules: PropertyRules,
}

impl<S: PropertySource> PropertyBlocks<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            rules: PropertyRules::builtin(),
        }
    }

    pub fn with_rules(mut self, rules: PropertyRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn read_string(&self, block: BlockId, path: &str) -> FontResult<String> {
        match self.rules.read(&self.source, block, path)? {
            PropertyValue::String(value) => Ok(value),
            other => Err(FontError::Document(format!(
                "\"{}\" is {:?}, expected a string",
                path,
                other.kind()
            ))),
        }
    }
}

impl<S: PropertySource> BlockStore for PropertyBlocks<S> {
    fn block_ids(&self) -> Vec<BlockId> {
        self.source.block_ids()
    }

    fn text(&self, block: BlockId) -> FontResult<String> {
        self.read_string(block, TEXT_PATH)
    }

    fn family(&self, block: BlockId) -> FontResult<String> {
        self.read_string(block, TYPEFACE_PATH)
    }

    fn set_family(&mut self, block: BlockId, family: &str) -> FontResult<()> {
        self.source.set_string(block, TYPEFACE_PATH, family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemorySource {
        strings: HashMap<(BlockId, String), String>,
        numbers: HashMap<(BlockId, String), f64>,
        bools: HashMap<(BlockId, String), bool>,
        colors: HashMap<(BlockId, String), Color>,
    }

    impl MemorySource {
        fn text_block(mut self, block: BlockId, text: &str, family: &str) -> Self {
            self.strings.insert((block, TEXT_PATH.into()), text.into());
            self.strings.insert((block, TYPEFACE_PATH.into()), family.into());
            self
        }
    }

    impl PropertySource for MemorySource {
        fn block_ids(&self) -> Vec<BlockId> {
            let mut ids: Vec<BlockId> = self.strings.keys().map(|(b, _)| *b).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        }

        fn get_string(&self, block: BlockId, path: &str) -> Option<String> {
            self.strings.get(&(block, path.to_string())).cloned()
        }

        fn get_number(&self, block: BlockId, path: &str) -> Option<f64> {
            self.numbers.get(&(block, path.to_string())).copied()
        }

        fn get_bool(&self, block: BlockId, path: &str) -> Option<bool> {
            self.bools.get(&(block, path.to_string())).copied()
        }

        fn get_color(&self, block: BlockId, path: &str) -> Option<Color> {
            self.colors.get(&(block, path.to_string())).copied()
        }

        fn set_string(&mut self, block: BlockId, path: &str, value: &str) -> FontResult<()> {
            self.strings.insert((block, path.to_string()), value.to_string());
            Ok(())
        }
    }

    #[test]
    fn paths_are_classified_by_rule() {
        let rules = PropertyRules::builtin();
        assert_eq!(rules.classify("fill/solid/color"), PropertyKind::Color);
        assert_eq!(rules.classify("dropShadow/color"), PropertyKind::Color);
        assert_eq!(rules.classify("text/fontSize"), PropertyKind::Number);
        assert_eq!(rules.classify("dropShadow/offset/x"), PropertyKind::Number);
        assert_eq!(rules.classify("stroke/enabled"), PropertyKind::Bool);
        assert_eq!(rules.classify("visible"), PropertyKind::Bool);
        assert_eq!(rules.classify("text/typeface"), PropertyKind::String);
        assert_eq!(rules.classify("fill/image/imageFileURI"), PropertyKind::String);
        assert_eq!(rules.classify("blend/mode"), PropertyKind::String);
        assert_eq!(rules.classify("fill/image/sourceSet"), PropertyKind::Unsupported);
    }

    #[test]
    fn read_dispatches_to_one_getter() {
        let mut source = MemorySource::default();
        let red = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
        source.colors.insert((7, "text/color".into()), red);
        source.numbers.insert((7, "opacity".into()), 0.5);
        // stored under the wrong type: the string getter is never tried
        source.strings.insert((7, "rotation".into()), "90".into());

        let rules = PropertyRules::builtin();
        assert_eq!(rules.read(&source, 7, "text/color").unwrap(), PropertyValue::Color(red));
        assert_eq!(rules.read(&source, 7, "opacity").unwrap().kind(), PropertyKind::Number);
        assert!(matches!(rules.read(&source, 7, "rotation"), Err(FontError::Document(_))));
        assert_eq!(rules.read(&source, 7, "fill/image/sourceSet").unwrap(), PropertyValue::Unsupported);
    }

    #[test]
    fn custom_rules_extend_the_table() {
        let mut rules = PropertyRules::empty();
        assert_eq!(rules.classify("text/text"), PropertyKind::Unsupported);
        rules.push(PathRule::Prefix("text/".into()), PropertyKind::String);
        assert_eq!(rules.classify("text/text"), PropertyKind::String);
    }

    #[test]
    fn property_blocks_act_as_a_block_store() {
        let source = MemorySource::default()
            .text_block(2, "SELL FAST", "")
            .text_block(1, "HELLO", "Roboto");
        let mut blocks = PropertyBlocks::new(source);

        assert_eq!(blocks.block_ids(), vec![1, 2]);
        assert_eq!(blocks.text(2).unwrap(), "SELL FAST");
        assert_eq!(blocks.family(1).unwrap(), "Roboto");

        blocks.set_family(2, "Inter").unwrap();
        assert_eq!(blocks.family(2).unwrap(), "Inter");
        assert!(blocks.text(3).is_err());
    }

    #[test]
    fn values_serialize_as_tagged_unions() {
        let json = serde_json::to_value(PropertyValue::Number(12.0)).unwrap();
        assert_eq!(json["kind"], "number");
        assert_eq!(json["value"], 12.0);
    }
}
