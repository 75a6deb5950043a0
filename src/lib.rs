//! Font resolution and post-parse font repair for imported design documents.
//!
//! The crates are re-exported here so callers can depend on a single package:
//!
//! - [`FontResolver`] answers the document engine's per-request font callback.
//! - [`DiagnosticCorrelator`] repairs blocks after the parse using the engine's warnings.
//! - [`load_config`] reads the [`ResolverConfig`] both are built from.

pub use font_cache::{CacheEntry, CacheKey, CacheStats, ResolutionCache};
pub use font_core::*;
pub use font_matcher::{MatchQuality, MatchedVariant, VariantQuery, WeightMatcher};
pub use font_normalizer::{AliasMap, AliasTables, NameNormalizer, SubstitutionTable, WeightAliasMap};
pub use font_repair::{
    missing_families, text_font_map, BlockId, BlockRepair, BlockStore, DiagnosticCorrelator, ParsedWarning,
    Color, PropertyBlocks, PropertyKind, PropertyRules, PropertySource, PropertyValue, RepairReason, RepairReport,
};
pub use font_resolver_engine::{
    EngineCallback, EngineResolution, FontResolver, Resolution, ResolutionOutcome, Typeface,
};
pub use font_setup::{apply_env_overrides, load_config, load_config_from, save_config, save_config_to};
pub use font_sources::{
    ChainHit, ConfiguredListProvider, FontProvider, LocalDirectoryProvider, ProviderChain, ProviderMatch,
    RemoteCatalogProvider, SourceInfo, SourceStatus,
};
