use async_trait::async_trait;
use font_core::{FamilyCatalogEntry, FontRecord, FontResult, ProviderKind};

use crate::{FontProvider, ProviderMatch};

/// Fonts the engine was configured with at startup.
/// Family names must match exactly, case included.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredListProvider {
    fonts: Vec<FontRecord>,
}

impl ConfiguredListProvider {
    pub fn new(fonts: Vec<FontRecord>) -> Self {
        let fonts = fonts
            .into_iter()
            .map(|record| record.with_provider(ProviderKind::Configured))
            .collect();
        Self { fonts }
    }

    pub fn fonts(&self) -> &[FontRecord] {
        &self.fonts
    }
}

#[async_trait]
impl FontProvider for ConfiguredListProvider {
    fn name(&self) -> &str {
        "Configured Fonts"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Configured
    }

    async fn lookup(&self, candidate: &str) -> FontResult<Option<ProviderMatch>> {
        let variants: Vec<FontRecord> = self
            .fonts
            .iter()
            .filter(|record| record.family == candidate)
            .cloned()
            .collect();

        Ok(match variants.len() {
            0 => None,
            1 => variants.into_iter().next().map(ProviderMatch::Record),
            _ => Some(ProviderMatch::Family(FamilyCatalogEntry::new(candidate, variants))),
        })
    }
}
