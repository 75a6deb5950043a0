use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use font_core::{
    CanonicalWeight, FamilyCatalogEntry, FontError, FontFormat, FontRecord, FontResult, FontStyle,
    ProviderKind, RemoteCatalogConfig,
};
use font_normalizer::WeightAliasMap;
use log::{debug, info, warn};
use parking_lot::Mutex;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio::time::Instant;

use crate::{slug, FontProvider, ProviderMatch};

const PROVIDER_NAME: &str = "Remote Catalog";

/// How long a failed catalog download suppresses further attempts
pub const FAILURE_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    items: Vec<CatalogItem>,
}

/// One family as the catalog service lists it
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    pub family: String,
    /// variant key ("regular", "700", "700italic", ...) -> file URL
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

/// Looks families up in a keyed web font catalog.
///
/// The catalog is downloaded on first use and kept for the lifetime of the
/// provider. After a failed download, lookups fail fast for
/// [`FAILURE_BACKOFF`] and then try again.
pub struct RemoteCatalogProvider {
    client: Client,
    config: RemoteCatalogConfig,
    weights: Arc<WeightAliasMap>,
    catalog: OnceCell<Vec<CatalogItem>>,
    failed_at: Mutex<Option<Instant>>,
}

impl RemoteCatalogProvider {
    pub fn new(config: RemoteCatalogConfig, weights: Arc<WeightAliasMap>) -> FontResult<Self> {
        let client = Client::builder()
            .user_agent("Typeface-Resolver/1.0")
            .timeout(config.timeout())
            .build()
            .map_err(|e| FontError::unavailable(PROVIDER_NAME, e))?;

        Ok(Self {
            client,
            config,
            weights,
            catalog: OnceCell::new(),
            failed_at: Mutex::new(None),
        })
    }

    fn catalog_url(&self, key: &str) -> FontResult<Url> {
        Url::parse_with_params(&self.config.endpoint, &[("key", key), ("sort", "alpha")])
            .map_err(|e| FontError::Config(format!("invalid catalog endpoint {}: {}", self.config.endpoint, e)))
    }

    async fn fetch_catalog(&self) -> FontResult<Vec<CatalogItem>> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| FontError::unavailable(PROVIDER_NAME, "no API key configured"))?;
        let url = self.catalog_url(key)?;

        debug!("[RemoteCatalog] fetching {}", self.config.endpoint);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FontError::unavailable(PROVIDER_NAME, format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FontError::unavailable(PROVIDER_NAME, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FontError::unavailable(PROVIDER_NAME, format!("network error: {}", e)))?;
        let items = parse_catalog(&body)?;
        info!("[RemoteCatalog] loaded {} families", items.len());
        Ok(items)
    }

    async fn catalog(&self) -> FontResult<&[CatalogItem]> {
        if let Some(items) = self.catalog.get() {
            return Ok(items);
        }
        if let Some(failed) = *self.failed_at.lock() {
            let since = failed.elapsed();
            if since < FAILURE_BACKOFF {
                return Err(FontError::unavailable(
                    PROVIDER_NAME,
                    format!("catalog fetch failed {}s ago, not retrying yet", since.as_secs()),
                ));
            }
        }

        match self.catalog.get_or_try_init(|| self.fetch_catalog()).await {
            Ok(items) => {
                *self.failed_at.lock() = None;
                Ok(items)
            }
            Err(e) => {
                warn!("[RemoteCatalog] {}; skipping the catalog for {:?}", e, FAILURE_BACKOFF);
                *self.failed_at.lock() = Some(Instant::now());
                Err(e)
            }
        }
    }
}

#[async_trait]
impl FontProvider for RemoteCatalogProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Remote
    }

    fn is_available(&self) -> bool {
        self.config.has_credential()
    }

    async fn lookup(&self, candidate: &str) -> FontResult<Option<ProviderMatch>> {
        let items = self.catalog().await?;
        Ok(match_family(items, candidate, &self.weights).map(ProviderMatch::Family))
    }
}

/// Parse the catalog body; a document without `items` is an error.
pub(crate) fn parse_catalog(body: &str) -> FontResult<Vec<CatalogItem>> {
    serde_json::from_str::<CatalogResponse>(body)
        .map(|response| response.items)
        .map_err(|e| FontError::unavailable(PROVIDER_NAME, format!("malformed catalog: {}", e)))
}

/// Case-insensitive exact family match. The "regular" file, when present,
/// becomes the first variant; the others follow in key order.
pub(crate) fn match_family(
    items: &[CatalogItem],
    candidate: &str,
    weights: &WeightAliasMap,
) -> Option<FamilyCatalogEntry> {
    let wanted = candidate.to_lowercase();
    let item = items.iter().find(|item| item.family.to_lowercase() == wanted)?;

    let mut keys: Vec<&String> = item.files.keys().collect();
    keys.sort_by_key(|k| k.as_str() != "regular");

    let variants: Vec<FontRecord> = keys
        .into_iter()
        .map(|key| variant_record(&item.family, key, &item.files[key], weights))
        .collect();

    if variants.is_empty() {
        warn!("[RemoteCatalog] \"{}\" lists no files", item.family);
        return None;
    }
    Some(FamilyCatalogEntry::new(item.family.clone(), variants))
}

fn variant_record(family: &str, key: &str, url: &str, weights: &WeightAliasMap) -> FontRecord {
    let lower = key.to_lowercase();
    let style = if lower.contains("italic") {
        FontStyle::Italic
    } else {
        FontStyle::Normal
    };
    let weight_part = lower.replace("italic", "");
    let weight = if weight_part.trim().is_empty() {
        CanonicalWeight::Normal
    } else {
        weights.canonicalize_str(&weight_part).unwrap_or(CanonicalWeight::Normal)
    };

    let mut record = FontRecord::new(format!("remote-{}-{}", slug(family), lower), family, weight)
        .with_style(style)
        .with_provider(ProviderKind::Remote);
    record.source_uri = Some(url.to_string());
    record.format_hint = format_from_uri(url);
    record
}

fn format_from_uri(uri: &str) -> Option<FontFormat> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(FontFormat::from_extension(ext)).filter(|f| f.is_loadable())
}
