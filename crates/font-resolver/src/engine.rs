//! Adapter between the resolver and the document engine's font callback.
//!
//! The engine asks for `{ typeface, font }` per request and treats `None`
//! as "apply your own default".

use std::sync::Arc;

use font_core::{FontError, FontRecord, FontRequest, FontResult};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Runtime};

use crate::FontResolver;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typeface {
    pub id: String,
    pub name: String,
    pub fonts: Vec<FontRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResolution {
    pub typeface: Typeface,
    pub font: FontRecord,
}

impl From<FontRecord> for EngineResolution {
    fn from(font: FontRecord) -> Self {
        Self {
            typeface: Typeface {
                id: font.identifier.clone(),
                name: font.family.clone(),
                fonts: vec![font.clone()],
            },
            font,
        }
    }
}

impl FontResolver {
    /// Resolution shaped for the engine. With `defer_fallback_to_engine`
    /// set, the fallback record becomes `None`.
    pub async fn resolve_for_engine(&self, request: &FontRequest) -> Option<EngineResolution> {
        let record = self.resolve(request).await;
        if record.is_system_fallback() && self.config().defer_fallback_to_engine {
            return None;
        }
        Some(EngineResolution::from(record))
    }
}

/// Blocking wrapper for engines whose font callback is synchronous.
/// Must not be called from inside an async runtime.
pub struct EngineCallback {
    resolver: Arc<FontResolver>,
    runtime: Runtime,
}

impl EngineCallback {
    pub fn new(resolver: Arc<FontResolver>) -> FontResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build().map_err(FontError::Io)?;
        Ok(Self { resolver, runtime })
    }

    pub fn resolver(&self) -> &Arc<FontResolver> {
        &self.resolver
    }

    pub fn resolve(&self, request: &FontRequest) -> Option<EngineResolution> {
        self.runtime.block_on(self.resolver.resolve_for_engine(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_core::{CanonicalWeight, ResolverConfig};

    fn config(defer: bool) -> ResolverConfig {
        ResolverConfig {
            configured_fonts: vec![FontRecord::new("tinos-regular", "Tinos", CanonicalWeight::Normal)],
            defer_fallback_to_engine: defer,
            ..ResolverConfig::default()
        }
    }

    #[test]
    fn typeface_wraps_the_resolved_font() {
        let resolver = FontResolver::from_config(config(false)).unwrap();
        let callback = EngineCallback::new(Arc::new(resolver)).unwrap();

        let resolution = callback.resolve(&FontRequest::family("Georgia")).unwrap();
        assert_eq!(resolution.typeface.id, "tinos-regular");
        assert_eq!(resolution.typeface.name, "Tinos");
        assert_eq!(resolution.typeface.fonts, vec![resolution.font.clone()]);
    }

    #[test]
    fn fallback_is_returned_or_deferred() {
        let callback = EngineCallback::new(Arc::new(FontResolver::from_config(config(false)).unwrap())).unwrap();
        let resolution = callback.resolve(&FontRequest::family("Nonexistent")).unwrap();
        assert!(resolution.font.is_system_fallback());

        let callback = EngineCallback::new(Arc::new(FontResolver::from_config(config(true)).unwrap())).unwrap();
        assert!(callback.resolve(&FontRequest::family("Nonexistent")).is_none());
    }

    #[test]
    fn engine_resolution_serializes_camel_case_records() {
        let json = serde_json::to_value(EngineResolution::from(FontRecord::system_fallback())).unwrap();
        assert_eq!(json["font"]["identifier"], "system-Arial");
        assert_eq!(json["typeface"]["fonts"][0]["provider"], "system");
    }
}
