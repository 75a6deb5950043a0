use std::sync::Arc;
use std::time::Duration;

use font_cache::{CacheEntry, CacheKey, CacheStats, ResolutionCache};
use font_core::{FontRecord, FontRequest, FontResult, ProviderKind, ResolverConfig};
use font_matcher::{MatchQuality, WeightMatcher};
use font_normalizer::{AliasTables, NameNormalizer};
use font_sources::{ProviderChain, SourceInfo};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

mod engine;

pub use engine::{EngineCallback, EngineResolution, Typeface};

/// Terminal state of one resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    /// Answered from the session cache (resolved or not)
    CacheHit,
    Resolved {
        provider: ProviderKind,
        candidate: String,
        quality: MatchQuality,
    },
    /// No candidate/provider pair matched
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub record: FontRecord,
    pub outcome: ResolutionOutcome,
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        self.record.is_system_fallback()
    }
}

/// Single entry point for font lookups during a parse session.
///
/// Every call yields a record: a provider match, or the system fallback
/// when nothing matched. Both outcomes are cached under the normalized
/// request.
pub struct FontResolver {
    normalizer: NameNormalizer,
    chain: ProviderChain,
    matcher: WeightMatcher,
    cache: Arc<ResolutionCache>,
    config: ResolverConfig,
}

impl FontResolver {
    pub fn new(
        normalizer: NameNormalizer,
        chain: ProviderChain,
        matcher: WeightMatcher,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        Self {
            normalizer,
            chain,
            matcher,
            cache,
            config: ResolverConfig::default(),
        }
    }

    /// Tables, standard provider chain and matcher built from `config`
    pub fn from_config(config: ResolverConfig) -> FontResult<Self> {
        let tables = Arc::new(AliasTables::from_config(&config));
        let weights = Arc::new(tables.weights.clone());
        let chain = ProviderChain::standard(&config, Arc::clone(&weights))?;
        let matcher = WeightMatcher::new(weights, config.weight_matching);

        info!(
            "[FontResolver] {} provider(s), weight matching {}",
            chain.len(),
            config.weight_matching
        );
        Ok(Self {
            normalizer: NameNormalizer::new(tables),
            chain,
            matcher,
            cache: Arc::new(ResolutionCache::new()),
            config,
        })
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn list_sources(&self) -> Vec<SourceInfo> {
        self.chain.list_sources()
    }

    /// Resolve `request`, honouring the configured timeout if there is one
    pub async fn resolve(&self, request: &FontRequest) -> FontRecord {
        match self.config.resolve_timeout() {
            Some(limit) => self.resolve_with_timeout(request, limit).await,
            None => self.resolve_detailed(request).await.record,
        }
    }

    /// Like [`resolve`](Self::resolve) but gives up after `limit`. A timed-out
    /// call returns the fallback record without caching it.
    pub async fn resolve_with_timeout(&self, request: &FontRequest, limit: Duration) -> FontRecord {
        match tokio::time::timeout(limit, self.resolve_detailed(request)).await {
            Ok(resolution) => resolution.record,
            Err(_) => {
                warn!("[FontResolver] \"{}\" timed out after {:?}", request.family, limit);
                FontRecord::system_fallback()
            }
        }
    }

    pub fn cache_key(&self, request: &FontRequest) -> CacheKey {
        let query = self.matcher.query(request);
        CacheKey::new(self.normalizer.normalized_family(&request.family), query.weight, query.style)
    }

    pub async fn resolve_detailed(&self, request: &FontRequest) -> Resolution {
        let key = self.cache_key(request);
        if let Some(entry) = self.cache.get(&key) {
            debug!("[FontResolver] cache hit for {:?}", key);
            return Resolution {
                record: entry.record(),
                outcome: ResolutionOutcome::CacheHit,
            };
        }

        let candidates = self.normalizer.candidates(&request.family);
        if candidates.is_empty() {
            debug!("[FontResolver] empty family, using fallback");
            return self.fallback(key);
        }

        let Some(hit) = self.chain.find(&candidates).await else {
            info!("[FontResolver] no provider matched \"{}\" ({} candidate(s))", request.family, candidates.len());
            return self.fallback(key);
        };

        let Some(matched) = self.matcher.select(request, &hit.catalog) else {
            return self.fallback(key);
        };
        let record = matched.record.clone();
        let quality = matched.quality;
        info!(
            "[FontResolver] \"{}\" -> {} via {} ({:?})",
            request.family, record.identifier, hit.provider_name, quality
        );

        let stored = self.cache.insert(key, CacheEntry::Resolved(record));
        Resolution {
            record: stored.record(),
            outcome: ResolutionOutcome::Resolved {
                provider: hit.provider,
                candidate: hit.candidate,
                quality,
            },
        }
    }

    fn fallback(&self, key: CacheKey) -> Resolution {
        let stored = self.cache.insert(key, CacheEntry::Unresolved);
        Resolution {
            record: stored.record(),
            outcome: ResolutionOutcome::Fallback,
        }
    }
}
