use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use font_core::{
    CanonicalWeight, FamilyCatalogEntry, FontError, FontFormat, FontRecord, FontResult, FontStyle,
    ProviderKind,
};
use font_normalizer::{NameNormalizer, WeightAliasMap};
use log::{debug, info};
use once_cell::sync::OnceCell;
use walkdir::WalkDir;

use crate::{FontProvider, ProviderMatch};

const PROVIDER_NAME: &str = "Local Directory";

/// Font files sitting directly in one directory.
///
/// A file matches a candidate when its name, with separators and case
/// ignored, contains the candidate. The directory is listed once.
pub struct LocalDirectoryProvider {
    dir: Option<PathBuf>,
    weights: Arc<WeightAliasMap>,
    files: OnceCell<Vec<PathBuf>>,
}

impl LocalDirectoryProvider {
    pub fn new(dir: Option<PathBuf>, weights: Arc<WeightAliasMap>) -> Self {
        Self {
            dir,
            weights,
            files: OnceCell::new(),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn files(&self) -> FontResult<&[PathBuf]> {
        let dir = self
            .dir
            .as_deref()
            .ok_or_else(|| FontError::unavailable(PROVIDER_NAME, "no font directory configured"))?;
        self.files
            .get_or_try_init(|| list_font_files(dir))
            .map(Vec::as_slice)
    }

    fn record_for(&self, candidate: &str, path: &Path) -> FontRecord {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let words: Vec<String> = NameNormalizer::split_words(stem)
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(FontFormat::from_extension)
            .unwrap_or(FontFormat::Other);

        FontRecord::new(format!("local-{}", words.join("-")), candidate, detect_weight(&words, &self.weights))
            .with_style(detect_style(&words))
            .with_provider(ProviderKind::Local)
            .with_source(format!("file://{}", path.display()), format)
    }
}

#[async_trait]
impl FontProvider for LocalDirectoryProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn is_available(&self) -> bool {
        self.dir.is_some()
    }

    async fn lookup(&self, candidate: &str) -> FontResult<Option<ProviderMatch>> {
        let wanted = compact(candidate);
        if wanted.is_empty() {
            return Ok(None);
        }

        let variants: Vec<FontRecord> = self
            .files()?
            .iter()
            .filter(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map_or(false, |stem| compact(stem).contains(&wanted))
            })
            .map(|path| self.record_for(candidate, path))
            .collect();

        if variants.is_empty() {
            return Ok(None);
        }
        debug!("[LocalDirectory] {} file(s) match \"{}\"", variants.len(), candidate);
        Ok(Some(ProviderMatch::Family(FamilyCatalogEntry::new(candidate, variants))))
    }
}

fn list_font_files(dir: &Path) -> FontResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| FontError::Io(e.into()))?;
        let path = entry.path();
        if entry.file_type().is_file() && is_font_file(path) {
            files.push(path.to_path_buf());
        }
    }
    info!("[LocalDirectory] {} font file(s) in {}", files.len(), dir.display());
    Ok(files)
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| FontFormat::from_extension(ext).is_loadable())
}

/// Lowercase alphanumerics only: "Bebas Neue" and "BebasNeue-Bold" compare
/// as "bebasneue" and "bebasneuebold".
fn compact(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

// Two-word keywords ("extra bold") are tried before single words.
fn detect_weight(words: &[String], weights: &WeightAliasMap) -> CanonicalWeight {
    let pairs = words
        .windows(2)
        .find_map(|pair| weights.canonicalize_str(&format!("{}{}", pair[0], pair[1])));
    pairs
        .or_else(|| {
            words
                .iter()
                .skip(1)
                .find_map(|word| weights.canonicalize_str(word))
        })
        .unwrap_or(CanonicalWeight::Normal)
}

fn detect_style(words: &[String]) -> FontStyle {
    if words.iter().any(|w| w == "italic") {
        FontStyle::Italic
    } else if words.iter().any(|w| w == "oblique") {
        FontStyle::Oblique
    } else {
        FontStyle::Normal
    }
}
