use std::sync::Arc;
use font_core::{
    CanonicalWeight, FamilyCatalogEntry, FontRecord, FontRequest, FontStyle, WeightMatchMode, WeightToken,
};
use font_normalizer::WeightAliasMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Weight and style of a request after canonicalization.
/// `None` means "no constraint" (absent or unrecognised token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VariantQuery {
    pub weight: Option<CanonicalWeight>,
    pub style: Option<FontStyle>,
}

impl VariantQuery {
    pub fn is_unconstrained(&self) -> bool {
        self.weight.is_none() && self.style.is_none()
    }
}

/// How a variant was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchQuality {
    /// Request had no weight or style; the first variant was taken
    Unconstrained,
    /// Weight and (if requested) style both agree
    Exact,
    /// Weight agrees, requested style does not exist
    WeightOnly,
    /// No weight requested, style agrees
    StyleOnly,
    /// Any recognised weight accepted the variant
    Lenient,
    /// Nothing agreed; first variant in catalog order
    FirstVariant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedVariant<'a> {
    pub record: &'a FontRecord,
    pub quality: MatchQuality,
}

/// Picks one variant of a resolved family for a request
#[derive(Debug, Clone)]
pub struct WeightMatcher {
    weights: Arc<WeightAliasMap>,
    mode: WeightMatchMode,
}

impl WeightMatcher {
    pub fn new(weights: Arc<WeightAliasMap>, mode: WeightMatchMode) -> Self {
        Self { weights, mode }
    }

    pub fn mode(&self) -> WeightMatchMode {
        self.mode
    }

    pub fn canonical_weight(&self, token: Option<&WeightToken>) -> Option<CanonicalWeight> {
        let token = token?;
        let weight = self.weights.canonicalize(token);
        if weight.is_none() {
            debug!("[WeightMatcher] unrecognised weight token \"{}\" ignored", token);
        }
        weight
    }

    pub fn query(&self, request: &FontRequest) -> VariantQuery {
        VariantQuery {
            weight: self.canonical_weight(request.weight.as_ref()),
            style: request.style.as_deref().and_then(FontStyle::parse),
        }
    }

    /// Select a variant of `catalog` for `request`. `None` only for an empty catalog.
    pub fn select<'a>(&self, request: &FontRequest, catalog: &'a FamilyCatalogEntry) -> Option<MatchedVariant<'a>> {
        self.select_for(&self.query(request), request.weight.is_some(), catalog)
    }

    pub fn select_query<'a>(&self, query: &VariantQuery, catalog: &'a FamilyCatalogEntry) -> Option<MatchedVariant<'a>> {
        self.select_for(query, query.weight.is_some(), catalog)
    }

    fn select_for<'a>(
        &self,
        query: &VariantQuery,
        weight_requested: bool,
        catalog: &'a FamilyCatalogEntry,
    ) -> Option<MatchedVariant<'a>> {
        let first = catalog.first()?;
        if query.is_unconstrained() && !weight_requested {
            return Some(MatchedVariant { record: first, quality: MatchQuality::Unconstrained });
        }

        let found = match self.mode {
            WeightMatchMode::Strict => Self::select_strict(query, catalog),
            WeightMatchMode::Lenient => catalog
                .variants
                .iter()
                .find(|record| query.style.map_or(true, |style| record.style == style))
                .map(|record| MatchedVariant { record, quality: MatchQuality::Lenient }),
        };

        let matched = found.unwrap_or(MatchedVariant { record: first, quality: MatchQuality::FirstVariant });
        trace!(
            "[WeightMatcher] {} {:?} -> {} ({:?})",
            catalog.family,
            query,
            matched.record.identifier,
            matched.quality
        );
        Some(matched)
    }

    // Without a requested style the upright variant is preferred.
    fn select_strict<'a>(query: &VariantQuery, catalog: &'a FamilyCatalogEntry) -> Option<MatchedVariant<'a>> {
        let variants = &catalog.variants;
        let style = query.style.unwrap_or(FontStyle::Normal);
        match query.weight {
            Some(weight) => variants
                .iter()
                .find(|r| r.weight == weight && r.style == style)
                .map(|record| MatchedVariant { record, quality: MatchQuality::Exact })
                .or_else(|| {
                    variants
                        .iter()
                        .find(|r| r.weight == weight)
                        .map(|record| MatchedVariant { record, quality: MatchQuality::WeightOnly })
                }),
            None => variants
                .iter()
                .find(|r| query.style.is_some() && r.style == style)
                .map(|record| MatchedVariant { record, quality: MatchQuality::StyleOnly }),
        }
    }
}

impl Default for WeightMatcher {
    fn default() -> Self {
        Self::new(Arc::new(WeightAliasMap::builtin()), WeightMatchMode::Strict)
    }
}
