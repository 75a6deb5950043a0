use std::collections::HashMap;
use std::sync::Arc;

use font_core::{DiagnosticMessage, FontRecord, FontRequest, FontResult};
use font_normalizer::SubstitutionTable;
use font_resolver_engine::FontResolver;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;

pub mod diagnostics;
pub mod property;

pub use diagnostics::{missing_families, parse_warnings, text_font_map, ParsedWarning};
pub use property::{
    Color, PathRule, PropertyBlocks, PropertyKind, PropertyRules, PropertySource, PropertyValue, TEXT_PATH,
    TYPEFACE_PATH,
};

pub type BlockId = u32;

/// The engine's view of the text blocks in a parsed document
pub trait BlockStore {
    /// Blocks in enumeration order
    fn block_ids(&self) -> Vec<BlockId>;

    fn text(&self, block: BlockId) -> FontResult<String>;

    fn family(&self, block: BlockId) -> FontResult<String>;

    fn set_family(&mut self, block: BlockId, family: &str) -> FontResult<()>;
}

/// Why a block was reassigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RepairReason {
    /// Block text matched the snippet of a typeface warning
    TextCorrelation { snippet: String },
    /// Current family is itself a missing family
    DirectMatch,
    /// Current family contains a missing family, or is contained in one
    ContainmentMatch,
    /// Current family equals a missing family once size and weight tokens are dropped
    NormalizedMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockRepair {
    pub block: BlockId,
    pub text: String,
    pub original_family: String,
    /// Missing family the block was correlated with
    pub missing_family: String,
    /// Family written to the block
    pub replacement: String,
    /// What the resolver returned for `replacement`
    pub resolved: FontRecord,
    pub reason: RepairReason,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairReport {
    pub repairs: Vec<BlockRepair>,
    /// Blocks that got the default family
    pub defaults_applied: usize,
    /// Typeface warnings that could not be parsed
    pub skipped_warnings: usize,
    /// Repairs made on a low-confidence text correlation
    pub ambiguous: usize,
    pub verification_failures: usize,
    pub failed_updates: usize,
    /// Blocks whose text or family could not be read
    pub unreadable_blocks: usize,
}

impl RepairReport {
    pub fn changed_blocks(&self) -> usize {
        self.repairs.len() + self.defaults_applied
    }
}

struct Correlation {
    missing_family: String,
    replacement: String,
    reason: RepairReason,
    ambiguous: bool,
}

/// Post-parse pass that maps typeface warnings back onto blocks and
/// reassigns their fonts.
pub struct DiagnosticCorrelator {
    resolver: Arc<FontResolver>,
    substitutions: SubstitutionTable,
    default_family: String,
    placeholders: Vec<String>,
}

impl DiagnosticCorrelator {
    /// Substitutions come from the resolver's tables, the default and
    /// placeholder families from its configuration.
    pub fn new(resolver: Arc<FontResolver>) -> Self {
        let substitutions = resolver.normalizer().tables().substitutions.clone();
        let config = resolver.config();
        let default_family = config.default_family.clone();
        let placeholders = config.placeholder_families.clone();
        Self {
            resolver,
            substitutions,
            default_family,
            placeholders,
        }
    }

    pub fn with_substitutions(mut self, substitutions: SubstitutionTable) -> Self {
        self.substitutions = substitutions;
        self
    }

    pub fn with_default_family(mut self, family: impl Into<String>) -> Self {
        self.default_family = family.into();
        self
    }

    pub fn with_placeholders(mut self, placeholders: Vec<String>) -> Self {
        self.placeholders = placeholders;
        self
    }

    fn is_placeholder(&self, family: &str) -> bool {
        family.is_empty() || self.placeholders.iter().any(|p| p == family)
    }

    /// Run the pass over every block. Never fails: problems are logged and
    /// counted in the report.
    pub async fn repair<B: BlockStore + ?Sized>(&self, messages: &[DiagnosticMessage], blocks: &mut B) -> RepairReport {
        let (warnings, skipped) = parse_warnings(messages);
        let mut report = RepairReport {
            skipped_warnings: skipped,
            ..RepairReport::default()
        };

        let mut missing: Vec<&str> = Vec::new();
        for warning in &warnings {
            if !missing.contains(&warning.family.as_str()) {
                missing.push(&warning.family);
            }
        }
        if missing.is_empty() && !blocks_need_default(blocks) {
            debug!("[DiagnosticCorrelator] no missing fonts reported");
            return report;
        }
        info!("[DiagnosticCorrelator] missing families: {:?}", missing);

        // warning index -> blocks correlated with it so far
        let mut consumed: HashMap<usize, usize> = HashMap::new();

        for block in blocks.block_ids() {
            let (text, family) = match (blocks.text(block), blocks.family(block)) {
                (Ok(text), Ok(family)) => (text, family),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("[DiagnosticCorrelator] block {} unreadable: {}", block, e);
                    report.unreadable_blocks += 1;
                    continue;
                }
            };

            let by_text = if self.is_placeholder(&family) {
                self.correlate_text(&warnings, &text, &mut consumed)
            } else {
                None
            };
            let correlation = by_text.or_else(|| self.correlate_family(&missing, &family));

            match correlation {
                Some(found) if family.is_empty() || family != found.replacement => {
                    self.apply(blocks, block, text, family, found, &mut report).await;
                }
                Some(_) => {
                    debug!("[DiagnosticCorrelator] block {} already uses \"{}\"", block, family);
                }
                None if family.is_empty() => match blocks.set_family(block, &self.default_family) {
                    Ok(()) => {
                        info!("[DiagnosticCorrelator] block {} gets default \"{}\"", block, self.default_family);
                        report.defaults_applied += 1;
                    }
                    Err(e) => {
                        warn!("[DiagnosticCorrelator] block {}: default not applied: {}", block, e);
                        report.failed_updates += 1;
                    }
                },
                None => {}
            }
        }

        info!(
            "[DiagnosticCorrelator] {} repair(s), {} default(s), {} ambiguous",
            report.repairs.len(),
            report.defaults_applied,
            report.ambiguous
        );
        report
    }

    /// First warning (log order) whose snippet matches the block text
    fn correlate_text(
        &self,
        warnings: &[ParsedWarning],
        text: &str,
        consumed: &mut HashMap<usize, usize>,
    ) -> Option<Correlation> {
        let mut matching = warnings.iter().filter(|w| w.matches_text(text));
        let first = matching.next()?;
        let conflicting = matching.any(|w| w.family != first.family);

        let uses = consumed.entry(first.index).or_insert(0);
        *uses += 1;
        let ambiguous = conflicting || *uses > 1;

        Some(Correlation {
            missing_family: first.family.clone(),
            replacement: self.substitutions.substitute(&first.family).to_string(),
            reason: RepairReason::TextCorrelation {
                snippet: first.text.clone().unwrap_or_default(),
            },
            ambiguous,
        })
    }

    fn correlate_family(&self, missing: &[&str], family: &str) -> Option<Correlation> {
        if family.is_empty() {
            return None;
        }
        if missing.contains(&family) {
            return Some(Correlation {
                missing_family: family.to_string(),
                replacement: self.substitutions.substitute(family).to_string(),
                reason: RepairReason::DirectMatch,
                ambiguous: false,
            });
        }

        let stripped = strip_style_tokens(family);
        missing.iter().find_map(|m| {
            let reason = if m.contains(family) || family.contains(m) {
                RepairReason::ContainmentMatch
            } else if !stripped.is_empty() && strip_style_tokens(m) == stripped {
                RepairReason::NormalizedMatch
            } else {
                return None;
            };
            Some(Correlation {
                missing_family: m.to_string(),
                replacement: self.substitutions.get(m).unwrap_or(family).to_string(),
                reason,
                ambiguous: false,
            })
        })
    }

    async fn apply<B: BlockStore + ?Sized>(
        &self,
        blocks: &mut B,
        block: BlockId,
        text: String,
        original_family: String,
        found: Correlation,
        report: &mut RepairReport,
    ) {
        let resolved = self.resolver.resolve(&FontRequest::family(found.replacement.as_str())).await;

        if let Err(e) = blocks.set_family(block, &found.replacement) {
            warn!("[DiagnosticCorrelator] block {}: could not set \"{}\": {}", block, found.replacement, e);
            report.failed_updates += 1;
            return;
        }

        let verified = match blocks.family(block) {
            Ok(actual) if actual == found.replacement => true,
            Ok(actual) => {
                warn!(
                    "[DiagnosticCorrelator] block {}: expected \"{}\" after update, found \"{}\"",
                    block, found.replacement, actual
                );
                false
            }
            Err(e) => {
                warn!("[DiagnosticCorrelator] block {}: could not verify update: {}", block, e);
                false
            }
        };
        if !verified {
            report.verification_failures += 1;
        }

        if found.ambiguous {
            warn!(
                "[DiagnosticCorrelator] block {} (\"{}\") correlated with \"{}\" on shared text; low confidence",
                block, text, found.missing_family
            );
            report.ambiguous += 1;
        }

        info!(
            "[DiagnosticCorrelator] block {}: \"{}\" -> \"{}\" (missing \"{}\", resolved {})",
            block, original_family, found.replacement, found.missing_family, resolved.identifier
        );
        report.repairs.push(BlockRepair {
            block,
            text,
            original_family,
            missing_family: found.missing_family,
            replacement: found.replacement,
            resolved,
            reason: found.reason,
            verified,
        });
    }
}

fn blocks_need_default<B: BlockStore + ?Sized>(blocks: &B) -> bool {
    blocks
        .block_ids()
        .into_iter()
        .any(|block| blocks.family(block).map_or(false, |f| f.is_empty()))
}

/// Lowercased family with point sizes and weight words removed
fn strip_style_tokens(family: &str) -> String {
    lazy_static! {
        static ref STYLE_TOKENS: Regex = Regex::new(r"\d+pt|bold|thin|light|medium").unwrap();
    }
    STYLE_TOKENS.replace_all(&family.to_lowercase(), "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use font_cache::ResolutionCache;
    use font_core::{CanonicalWeight, FontError, ProviderKind, WeightMatchMode};
    use font_matcher::WeightMatcher;
    use font_normalizer::{NameNormalizer, WeightAliasMap};
    use font_sources::{FontProvider, ProviderChain, ProviderMatch};
    use std::sync::Mutex;

    /// Records every candidate it is asked about; knows a fixed set of families
    #[derive(Default)]
    struct Recorder {
        known: Vec<&'static str>,
        asked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FontProvider for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Local
        }

        async fn lookup(&self, candidate: &str) -> FontResult<Option<ProviderMatch>> {
            self.asked.lock().unwrap().push(candidate.to_string());
            Ok(self.known.iter().find(|k| **k == candidate).map(|family| {
                ProviderMatch::Record(
                    FontRecord::new(format!("local-{}", family), *family, CanonicalWeight::Normal)
                        .with_provider(ProviderKind::Local),
                )
            }))
        }
    }

    #[derive(Default)]
    struct Blocks {
        blocks: Vec<(BlockId, String, String)>,
        /// block ids whose writes are silently dropped
        sticky: Vec<BlockId>,
        /// block ids whose writes fail
        locked: Vec<BlockId>,
    }

    impl Blocks {
        fn with(mut self, id: BlockId, text: &str, family: &str) -> Self {
            self.blocks.push((id, text.to_string(), family.to_string()));
            self
        }

        fn family_of(&self, id: BlockId) -> &str {
            &self.blocks.iter().find(|b| b.0 == id).unwrap().2
        }
    }

    impl BlockStore for Blocks {
        fn block_ids(&self) -> Vec<BlockId> {
            self.blocks.iter().map(|b| b.0).collect()
        }

        fn text(&self, block: BlockId) -> FontResult<String> {
            self.blocks
                .iter()
                .find(|b| b.0 == block)
                .map(|b| b.1.clone())
                .ok_or_else(|| FontError::Document(format!("no block {}", block)))
        }

        fn family(&self, block: BlockId) -> FontResult<String> {
            self.blocks
                .iter()
                .find(|b| b.0 == block)
                .map(|b| b.2.clone())
                .ok_or_else(|| FontError::Document(format!("no block {}", block)))
        }

        fn set_family(&mut self, block: BlockId, family: &str) -> FontResult<()> {
            if self.locked.contains(&block) {
                return Err(FontError::Document(format!("block {} is locked", block)));
            }
            if self.sticky.contains(&block) {
                return Ok(());
            }
            let entry = self
                .blocks
                .iter_mut()
                .find(|b| b.0 == block)
                .ok_or_else(|| FontError::Document(format!("no block {}", block)))?;
            entry.2 = family.to_string();
            Ok(())
        }
    }

    fn correlator(known: Vec<&'static str>) -> (DiagnosticCorrelator, Arc<Recorder>) {
        let recorder = Arc::new(Recorder { known, ..Recorder::default() });
        let resolver = FontResolver::new(
            NameNormalizer::default(),
            ProviderChain::new().with_provider(recorder.clone()),
            WeightMatcher::new(Arc::new(WeightAliasMap::builtin()), WeightMatchMode::Strict),
            Arc::new(ResolutionCache::new()),
        );
        (DiagnosticCorrelator::new(Arc::new(resolver)), recorder)
    }

    fn warning(family: &str, text: &str) -> DiagnosticMessage {
        DiagnosticMessage::warning(format!(
            "Could not find a typeface for font family '{}' used by text: '{}'",
            family, text
        ))
    }

    #[test_log::test(tokio::test)]
    async fn text_correlation_substitutes_and_resolves() {
        let (correlator, recorder) = correlator(vec!["Aviano Sans Light"]);
        let mut blocks = Blocks::default().with(1, "SELL FAST TODAY", "");

        let report = correlator.repair(&[warning("Aviano Sans", "SELL")], &mut blocks).await;

        assert_eq!(blocks.family_of(1), "Aviano Sans Light");
        assert_eq!(recorder.asked.lock().unwrap()[0], "Aviano Sans Light");
        assert_eq!(report.repairs.len(), 1);
        let repair = &report.repairs[0];
        assert_eq!(repair.missing_family, "Aviano Sans");
        assert_eq!(repair.resolved.identifier, "local-Aviano Sans Light");
        assert_eq!(repair.reason, RepairReason::TextCorrelation { snippet: "SELL".into() });
        assert!(repair.verified);
        assert_eq!(report.ambiguous, 0);
    }

    #[test_log::test(tokio::test)]
    async fn shared_text_gives_both_blocks_the_same_family() {
        let (correlator, _) = correlator(vec![]);
        let mut blocks = Blocks::default()
            .with(1, "SALE", "Open Sans")
            .with(2, "SALE", "");

        let report = correlator.repair(&[warning("Gotham", "SALE")], &mut blocks).await;

        assert_eq!(blocks.family_of(1), "Nunito Sans");
        assert_eq!(blocks.family_of(2), "Nunito Sans");
        assert_eq!(report.repairs.len(), 2);
        assert_eq!(report.ambiguous, 1);
        assert!(report.repairs.iter().all(|r| r.resolved.is_system_fallback()));
    }

    #[test_log::test(tokio::test)]
    async fn uncorrelated_empty_block_gets_the_default_family() {
        let (correlator, recorder) = correlator(vec![]);
        let mut blocks = Blocks::default()
            .with(1, "nothing to see", "")
            .with(2, "", "");

        let report = correlator.repair(&[warning("Gotham", "SALE")], &mut blocks).await;

        assert_eq!(blocks.family_of(1), "Open Sans");
        assert_eq!(blocks.family_of(2), "Open Sans");
        assert_eq!(report.defaults_applied, 2);
        assert!(report.repairs.is_empty());
        assert!(recorder.asked.lock().unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn set_families_are_matched_directly_by_containment_or_after_stripping_tokens() {
        let (correlator, _) = correlator(vec![]);
        let mut blocks = Blocks::default()
            .with(1, "A", "Helvetica Neue")
            .with(2, "B", "Inter 28pt Bold")
            .with(3, "C", "Lobster")
            .with(4, "D", "Proxima")
            .with(5, "E", "AvianoSansLight");

        let messages = [
            DiagnosticMessage::warning("Could not find a typeface for font family 'Helvetica Neue'"),
            DiagnosticMessage::warning("Could not find a typeface for font family 'Inter'"),
            DiagnosticMessage::warning("Could not find a typeface for font family 'Proxima Nova'"),
            DiagnosticMessage::warning("Could not find a typeface for font family 'AvianoSansBold'"),
        ];
        let report = correlator.repair(&messages, &mut blocks).await;

        assert_eq!(blocks.family_of(1), "Inter");
        assert_eq!(blocks.family_of(2), "Inter");
        assert_eq!(blocks.family_of(3), "Lobster");
        assert_eq!(blocks.family_of(4), "Nunito Sans");
        assert_eq!(blocks.family_of(5), "Aviano Sans Bold");

        let reasons: Vec<_> = report.repairs.iter().map(|r| (r.block, r.reason.clone())).collect();
        assert_eq!(
            reasons,
            vec![
                (1, RepairReason::DirectMatch),
                (2, RepairReason::ContainmentMatch),
                (4, RepairReason::ContainmentMatch),
                (5, RepairReason::NormalizedMatch),
            ]
        );
        assert_eq!(report.repairs[1].missing_family, "Inter");
    }

    #[test_log::test(tokio::test)]
    async fn contained_family_without_substitution_is_left_alone() {
        let (correlator, _) = correlator(vec![]);
        let mut blocks = Blocks::default().with(1, "A", "Lobster Two");

        let messages = [DiagnosticMessage::warning("Could not find a typeface for font family 'Lobster'")];
        let report = correlator.repair(&messages, &mut blocks).await;

        // no table entry for "Lobster": the replacement is the block's own family
        assert_eq!(blocks.family_of(1), "Lobster Two");
        assert!(report.repairs.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn failed_writes_and_verification_are_counted() {
        let (correlator, _) = correlator(vec![]);
        let mut blocks = Blocks {
            sticky: vec![1],
            locked: vec![2],
            ..Blocks::default()
        }
        .with(1, "SELL", "")
        .with(2, "NOW", "");

        let messages = [warning("Aviano Sans", "SELL"), warning("Gotham", "NOW")];
        let report = correlator.repair(&messages, &mut blocks).await;

        assert_eq!(report.verification_failures, 1);
        assert!(!report.repairs[0].verified);
        assert_eq!(report.failed_updates, 1);
        assert_eq!(blocks.family_of(2), "");
    }

    #[test_log::test(tokio::test)]
    async fn malformed_warnings_are_skipped() {
        let (correlator, _) = correlator(vec![]);
        let mut blocks = Blocks::default().with(1, "SELL", "Roboto");

        let messages = [DiagnosticMessage::warning("Could not find a typeface (details unavailable)")];
        let report = correlator.repair(&messages, &mut blocks).await;

        assert_eq!(report.skipped_warnings, 1);
        assert_eq!(report.changed_blocks(), 0);
        assert_eq!(blocks.family_of(1), "Roboto");
    }

    #[test]
    fn style_tokens_are_stripped() {
        assert_eq!(strip_style_tokens("Inter 28pt Bold"), "inter");
        assert_eq!(strip_style_tokens("AvianoSansLight"), "avianosans");
        assert_eq!(strip_style_tokens("Bold"), "");
    }
}
