use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use serde::{Serialize, Deserialize};

/// Identifier of the constant record handed out when nothing matched
pub const SYSTEM_FALLBACK_IDENTIFIER: &str = "system-Arial";

/// Family of the constant fallback record
pub const SYSTEM_FALLBACK_FAMILY: &str = "Arial";

/// Default endpoint of the remote web font catalog
pub const DEFAULT_CATALOG_ENDPOINT: &str = "https://www.googleapis.com/webfonts/v1/webfonts";

/// A font needed while the document engine parses text layers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontRequest {
    /// Family name as written in the document (may be empty)
    pub family: String,

    /// Requested weight, either a number (`700`) or a token (`"bold"`, `"700"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<WeightToken>,

    /// Requested style (`"italic"`, `"normal"`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl FontRequest {
    /// Request a family without weight or style constraints
    pub fn family(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            weight: None,
            style: None,
        }
    }

    pub fn with_weight(mut self, weight: impl Into<WeightToken>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// True when neither weight nor style narrows the request
    pub fn is_unconstrained(&self) -> bool {
        self.weight.is_none() && self.style.is_none()
    }
}

/// Raw weight as the engine hands it over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightToken {
    Number(u32),
    Text(String),
}

impl From<u32> for WeightToken {
    fn from(value: u32) -> Self {
        WeightToken::Number(value)
    }
}

impl From<u16> for WeightToken {
    fn from(value: u16) -> Self {
        WeightToken::Number(value as u32)
    }
}

impl From<&str> for WeightToken {
    fn from(value: &str) -> Self {
        WeightToken::Text(value.to_string())
    }
}

impl From<String> for WeightToken {
    fn from(value: String) -> Self {
        WeightToken::Text(value)
    }
}

impl fmt::Display for WeightToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightToken::Number(n) => write!(f, "{}", n),
            WeightToken::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The nine ordinal weight buckets every weight token normalizes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalWeight {
    Thin,
    ExtraLight,
    Light,
    Normal,
    Medium,
    SemiBold,
    Bold,
    ExtraBold,
    Heavy,
}

impl CanonicalWeight {
    pub const ALL: [CanonicalWeight; 9] = [
        CanonicalWeight::Thin,
        CanonicalWeight::ExtraLight,
        CanonicalWeight::Light,
        CanonicalWeight::Normal,
        CanonicalWeight::Medium,
        CanonicalWeight::SemiBold,
        CanonicalWeight::Bold,
        CanonicalWeight::ExtraBold,
        CanonicalWeight::Heavy,
    ];

    /// CSS-style numeric weight (100-900)
    pub fn numeric(self) -> u16 {
        (self as u16 + 1) * 100
    }

    /// Bucket an arbitrary numeric weight to the nearest hundred, clamped to 100..=900
    pub fn from_numeric(value: u32) -> Self {
        let bucket = (value.saturating_add(50) / 100).clamp(1, 9) as usize;
        Self::ALL[bucket - 1]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalWeight::Thin => "thin",
            CanonicalWeight::ExtraLight => "extraLight",
            CanonicalWeight::Light => "light",
            CanonicalWeight::Normal => "normal",
            CanonicalWeight::Medium => "medium",
            CanonicalWeight::SemiBold => "semiBold",
            CanonicalWeight::Bold => "bold",
            CanonicalWeight::ExtraBold => "extraBold",
            CanonicalWeight::Heavy => "heavy",
        }
    }
}

impl Default for CanonicalWeight {
    fn default() -> Self {
        CanonicalWeight::Normal
    }
}

impl fmt::Display for CanonicalWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    /// Parse a style token; unknown tokens yield `None`
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "normal" | "regular" | "roman" | "upright" => Some(FontStyle::Normal),
            "italic" => Some(FontStyle::Italic),
            "oblique" | "slanted" => Some(FontStyle::Oblique),
            _ => None,
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontStyle::Normal => write!(f, "normal"),
            FontStyle::Italic => write!(f, "italic"),
            FontStyle::Oblique => write!(f, "oblique"),
        }
    }
}

/// Font file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFormat {
    Ttf,
    Otf,
    Woff,
    Woff2,
    Other,
}

impl FontFormat {
    /// Map a file extension (with or without the dot) to a format
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "ttf" => FontFormat::Ttf,
            "otf" => FontFormat::Otf,
            "woff" => FontFormat::Woff,
            "woff2" => FontFormat::Woff2,
            _ => FontFormat::Other,
        }
    }

    /// Is this one of the formats a font directory is scanned for?
    pub fn is_loadable(self) -> bool {
        !matches!(self, FontFormat::Other)
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontFormat::Ttf => write!(f, "ttf"),
            FontFormat::Otf => write!(f, "otf"),
            FontFormat::Woff => write!(f, "woff"),
            FontFormat::Woff2 => write!(f, "woff2"),
            FontFormat::Other => write!(f, "other"),
        }
    }
}

/// Where a resolved font came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Remote,
    Local,
    Configured,
    System,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Remote => write!(f, "remote"),
            ProviderKind::Local => write!(f, "local"),
            ProviderKind::Configured => write!(f, "configured"),
            ProviderKind::System => write!(f, "system"),
        }
    }
}

/// A concrete, loadable font. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontRecord {
    /// Stable identifier handed to the engine (e.g. "remote-roboto-700")
    pub identifier: String,

    /// Family name as the provider knows it
    pub family: String,

    pub weight: CanonicalWeight,

    #[serde(default)]
    pub style: FontStyle,

    pub provider: ProviderKind,

    /// URI the engine loads the font from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_hint: Option<FontFormat>,
}

impl FontRecord {
    /// A configured record with normal style and no URI
    pub fn new(identifier: impl Into<String>, family: impl Into<String>, weight: CanonicalWeight) -> Self {
        Self {
            identifier: identifier.into(),
            family: family.into(),
            weight,
            style: FontStyle::Normal,
            provider: ProviderKind::Configured,
            source_uri: None,
            format_hint: None,
        }
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_source(mut self, uri: impl Into<String>, format: FontFormat) -> Self {
        self.source_uri = Some(uri.into());
        self.format_hint = Some(format);
        self
    }

    /// The constant record used when no provider could answer
    pub fn system_fallback() -> Self {
        Self {
            identifier: SYSTEM_FALLBACK_IDENTIFIER.to_string(),
            family: SYSTEM_FALLBACK_FAMILY.to_string(),
            weight: CanonicalWeight::Normal,
            style: FontStyle::Normal,
            provider: ProviderKind::System,
            source_uri: None,
            format_hint: None,
        }
    }

    pub fn is_system_fallback(&self) -> bool {
        self.provider == ProviderKind::System && self.identifier == SYSTEM_FALLBACK_IDENTIFIER
    }
}

/// A family together with every variant a provider knows about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyCatalogEntry {
    pub family: String,
    pub variants: Vec<FontRecord>,
}

impl FamilyCatalogEntry {
    pub fn new(family: impl Into<String>, variants: Vec<FontRecord>) -> Self {
        Self {
            family: family.into(),
            variants,
        }
    }

    /// A single record is a one-variant catalog
    pub fn from_record(record: FontRecord) -> Self {
        Self {
            family: record.family.clone(),
            variants: vec![record],
        }
    }

    pub fn first(&self) -> Option<&FontRecord> {
        self.variants.first()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Severity of a parse-log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One entry from the document engine's parse log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub text: String,
}

impl DiagnosticMessage {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// How strictly a requested weight must agree with a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMatchMode {
    /// Canonical weights must be equal; otherwise the first variant is used
    #[default]
    Strict,
    /// Any recognised weight token accepts a variant (legacy behaviour)
    Lenient,
}

impl fmt::Display for WeightMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightMatchMode::Strict => write!(f, "Strict"),
            WeightMatchMode::Lenient => write!(f, "Lenient"),
        }
    }
}

/// Remote catalog service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteCatalogConfig {
    /// Catalog endpoint, queried as `<endpoint>?key=<api_key>&sort=alpha`
    pub endpoint: String,

    /// Without a key the remote provider is never attempted
    pub api_key: Option<String>,

    /// HTTP client timeout
    pub timeout_secs: u64,
}

impl Default for RemoteCatalogConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CATALOG_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl RemoteCatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().map_or(false, |k| !k.trim().is_empty())
    }
}

/// Configuration for font resolution and the repair pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub remote: RemoteCatalogConfig,

    /// Directory scanned for .ttf/.otf/.woff/.woff2 files
    pub local_font_dir: Option<PathBuf>,

    /// Fonts registered with the engine at startup
    pub configured_fonts: Vec<FontRecord>,

    /// Extra family aliases, merged over the built-in table
    pub family_aliases: HashMap<String, String>,

    /// Extra vendor substitutions, merged over the built-in table
    pub substitutions: HashMap<String, String>,

    /// Family the repair pass assigns to blocks it cannot correlate
    pub default_family: String,

    /// Families the engine applies when it silently gave up on a font
    pub placeholder_families: Vec<String>,

    pub weight_matching: WeightMatchMode,

    /// Hand `None` back to the engine instead of the system fallback record
    pub defer_fallback_to_engine: bool,

    /// Caller-side limit on a single resolution
    pub resolve_timeout_ms: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            remote: RemoteCatalogConfig::default(),
            local_font_dir: None,
            configured_fonts: Vec::new(),
            family_aliases: HashMap::new(),
            substitutions: HashMap::new(),
            default_family: "Open Sans".to_string(),
            placeholder_families: vec!["Open Sans".to_string()],
            weight_matching: WeightMatchMode::Strict,
            defer_fallback_to_engine: false,
            resolve_timeout_ms: None,
        }
    }
}

impl ResolverConfig {
    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout_ms.map(Duration::from_millis)
    }

    /// Is `family` one of the engine's placeholder defaults?
    pub fn is_placeholder(&self, family: &str) -> bool {
        self.placeholder_families.iter().any(|p| p == family)
    }
}

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("Font not found: {0}")]
    NotFound(String),

    #[error("Malformed diagnostic message: {0}")]
    MalformedDiagnostic(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Resolution timed out after {0:?}")]
    Timeout(Duration),
}

impl FontError {
    pub fn unavailable(provider: impl Into<String>, reason: impl fmt::Display) -> Self {
        FontError::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;
