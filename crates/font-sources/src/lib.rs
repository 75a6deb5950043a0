use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use font_core::{FamilyCatalogEntry, FontRecord, FontResult, ProviderKind, ResolverConfig};
use font_normalizer::WeightAliasMap;
use log::{debug, info, warn};

mod configured;
mod local;
mod remote;

pub use configured::ConfiguredListProvider;
pub use local::LocalDirectoryProvider;
pub use remote::{CatalogItem, RemoteCatalogProvider};

/// What a provider hands back for a candidate name
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderMatch {
    Record(FontRecord),
    Family(FamilyCatalogEntry),
}

impl ProviderMatch {
    /// A single record is treated as a one-variant catalog
    pub fn into_catalog(self) -> FamilyCatalogEntry {
        match self {
            ProviderMatch::Record(record) => FamilyCatalogEntry::from_record(record),
            ProviderMatch::Family(entry) => entry,
        }
    }
}

/// A font source that can answer a lookup for one candidate name.
///
/// `Ok(None)` means "no match". `Err` means the source could not be
/// consulted; the chain logs it and moves on.
#[async_trait]
pub trait FontProvider: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Providers that report `false` are skipped without being called
    fn is_available(&self) -> bool {
        true
    }

    async fn lookup(&self, candidate: &str) -> FontResult<Option<ProviderMatch>>;
}

/// First successful (candidate, provider) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ChainHit {
    pub candidate: String,
    pub provider: ProviderKind,
    pub provider_name: String,
    pub catalog: FamilyCatalogEntry,
}

/// Ordered list of providers, tried for each candidate in turn
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn FontProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self { providers: Vec::new() }
    }

    /// remote catalog -> local directory -> configured list
    pub fn standard(config: &ResolverConfig, weights: Arc<WeightAliasMap>) -> FontResult<Self> {
        let remote = RemoteCatalogProvider::new(config.remote.clone(), Arc::clone(&weights))?;
        let local = LocalDirectoryProvider::new(config.local_font_dir.clone(), weights);
        let configured = ConfiguredListProvider::new(config.configured_fonts.clone());

        Ok(Self::new()
            .with_provider(Arc::new(remote))
            .with_provider(Arc::new(local))
            .with_provider(Arc::new(configured)))
    }

    pub fn with_provider(mut self, provider: Arc<dyn FontProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn push(&mut self, provider: Arc<dyn FontProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Walk candidates (outer) and providers (inner); the first non-empty
    /// answer ends the whole search.
    pub async fn find(&self, candidates: &[String]) -> Option<ChainHit> {
        for candidate in candidates {
            for provider in &self.providers {
                if !provider.is_available() {
                    debug!("[ProviderChain] {} not available, skipping \"{}\"", provider.name(), candidate);
                    continue;
                }

                match provider.lookup(candidate).await {
                    Ok(Some(found)) => {
                        let catalog = found.into_catalog();
                        if catalog.is_empty() {
                            debug!("[ProviderChain] {} returned an empty family for \"{}\"", provider.name(), candidate);
                            continue;
                        }
                        info!(
                            "[ProviderChain] \"{}\" found by {} ({} variant(s))",
                            candidate,
                            provider.name(),
                            catalog.variants.len()
                        );
                        return Some(ChainHit {
                            candidate: candidate.clone(),
                            provider: provider.kind(),
                            provider_name: provider.name().to_string(),
                            catalog,
                        });
                    }
                    Ok(None) => {
                        debug!("[ProviderChain] {} has no match for \"{}\"", provider.name(), candidate);
                    }
                    Err(e) => {
                        warn!("[ProviderChain] {} failed for \"{}\": {}", provider.name(), candidate, e);
                    }
                }
            }
        }
        None
    }

    pub fn list_sources(&self) -> Vec<SourceInfo> {
        self.providers
            .iter()
            .enumerate()
            .map(|(index, provider)| SourceInfo {
                name: provider.name().to_string(),
                kind: provider.kind(),
                status: if provider.is_available() {
                    SourceStatus::Enabled
                } else {
                    SourceStatus::Disabled
                },
                index,
            })
            .collect()
    }
}

impl fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderChain")
            .field("providers", &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub name: String,
    pub kind: ProviderKind,
    pub status: SourceStatus,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    Enabled,
    Disabled,
}

/// Lowercase, hyphen-joined form used inside identifiers
pub(crate) fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_core::{CanonicalWeight, FontError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        kind: ProviderKind,
        answers: Vec<(&'static str, FontResult<()>)>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, kind: ProviderKind) -> Self {
            Self { name, kind, answers: Vec::new(), calls: AtomicUsize::new(0) }
        }

        fn knows(mut self, candidate: &'static str) -> Self {
            self.answers.push((candidate, Ok(())));
            self
        }

        fn fails_on(mut self, candidate: &'static str) -> Self {
            self.answers.push((candidate, Err(FontError::unavailable("scripted", "offline"))));
            self
        }
    }

    #[async_trait]
    impl FontProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn lookup(&self, candidate: &str) -> FontResult<Option<ProviderMatch>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answers.iter().find(|(c, _)| *c == candidate) {
                Some((_, Ok(()))) => Ok(Some(ProviderMatch::Record(
                    FontRecord::new(format!("{}-{}", self.name, candidate), candidate, CanonicalWeight::Normal)
                        .with_provider(self.kind),
                ))),
                Some((_, Err(_))) => Err(FontError::unavailable(self.name, "offline")),
                None => Ok(None),
            }
        }
    }

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test_log::test(tokio::test)]
    async fn first_provider_hit_wins_for_a_candidate() {
        let remote = Arc::new(Scripted::new("remote", ProviderKind::Remote));
        let local = Arc::new(Scripted::new("local", ProviderKind::Local).knows("Bebas Neue"));
        let configured = Arc::new(Scripted::new("configured", ProviderKind::Configured).knows("Bebas Neue"));
        let chain = ProviderChain::new()
            .with_provider(remote.clone())
            .with_provider(local.clone())
            .with_provider(configured.clone());

        let hit = chain.find(&candidates(&["Bebas Neue Bold", "Bebas Neue"])).await.unwrap();
        assert_eq!(hit.candidate, "Bebas Neue");
        assert_eq!(hit.provider, ProviderKind::Local);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
        assert_eq!(local.calls.load(Ordering::SeqCst), 2);
        // never reached for "Bebas Neue"
        assert_eq!(configured.calls.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn provider_errors_degrade_to_the_next_provider() {
        let remote = Arc::new(Scripted::new("remote", ProviderKind::Remote).fails_on("Inter"));
        let configured = Arc::new(Scripted::new("configured", ProviderKind::Configured).knows("Inter"));
        let chain = ProviderChain::new().with_provider(remote).with_provider(configured);

        let hit = chain.find(&candidates(&["Inter"])).await.unwrap();
        assert_eq!(hit.provider, ProviderKind::Configured);
    }

    #[test_log::test(tokio::test)]
    async fn exhausted_chain_returns_none() {
        let chain = ProviderChain::new().with_provider(Arc::new(Scripted::new("local", ProviderKind::Local)));
        assert!(chain.find(&candidates(&["Nope", "No"])).await.is_none());
        assert!(chain.find(&[]).await.is_none());
    }

    #[test]
    fn standard_chain_lists_remote_as_disabled_without_a_key() {
        let chain = ProviderChain::standard(&ResolverConfig::default(), Arc::new(WeightAliasMap::builtin())).unwrap();
        let sources = chain.list_sources();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].kind, ProviderKind::Remote);
        assert_eq!(sources[0].status, SourceStatus::Disabled);
        assert_eq!(sources[1].kind, ProviderKind::Local);
        assert_eq!(sources[2].kind, ProviderKind::Configured);
    }

    #[test]
    fn slug_joins_lowercase_words() {
        assert_eq!(slug("Open  Sans Bold"), "open-sans-bold");
    }
}
