use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use font_core::{FontError, FontResult, ResolverConfig};
use log::{debug, info};

/// Remote catalog key
pub const API_KEY_VAR: &str = "GOOGLE_FONTS_API_KEY";

/// Local font directory
pub const FONT_DIR_VAR: &str = "FONT_RESOLVER_FONT_DIR";

pub fn get_config_path() -> FontResult<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "typeface-resolver", "config")
        .ok_or_else(|| FontError::Config("could not determine config directory".into()))?;

    Ok(project_dirs.config_dir().join("config.toml"))
}

/// Config from the default location with environment overrides applied
pub fn load_config() -> FontResult<ResolverConfig> {
    let mut config = load_config_from(&get_config_path()?)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Config stored at `path`; defaults when the file does not exist
pub fn load_config_from(path: &Path) -> FontResult<ResolverConfig> {
    if !path.exists() {
        debug!("[Setup] no config at {}, using defaults", path.display());
        return Ok(ResolverConfig::default());
    }

    let config_str = std::fs::read_to_string(path)?;
    let config: ResolverConfig = toml::from_str(&config_str)
        .map_err(|e| FontError::Config(format!("{}: {}", path.display(), e)))?;
    info!("[Setup] loaded config from {}", path.display());
    Ok(config)
}

pub fn save_config(config: &ResolverConfig) -> FontResult<PathBuf> {
    let path = get_config_path()?;
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &ResolverConfig, path: &Path) -> FontResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config_str = toml::to_string_pretty(config).map_err(|e| FontError::Config(e.to_string()))?;
    std::fs::write(path, config_str)?;
    Ok(())
}

pub fn apply_env_overrides(config: &mut ResolverConfig) {
    apply_overrides(config, |name| std::env::var(name).ok());
}

/// Apply overrides from any variable lookup. Empty values are ignored.
pub fn apply_overrides(config: &mut ResolverConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = get(API_KEY_VAR) {
        debug!("[Setup] remote catalog key taken from {}", API_KEY_VAR);
        config.remote.api_key = Some(key);
    }
    if let Some(dir) = get(FONT_DIR_VAR) {
        debug!("[Setup] font directory taken from {}: {}", FONT_DIR_VAR, dir);
        config.local_font_dir = Some(PathBuf::from(dir));
    }
}

/// Human-readable one-line-per-setting summary. The key itself is never shown.
pub fn config_summary(config: &ResolverConfig) -> String {
    let mut lines = vec![
        format!("remote catalog: {}", config.remote.endpoint),
        format!(
            "remote key: {}",
            if config.remote.has_credential() { "set" } else { "not set" }
        ),
        format!(
            "font directory: {}",
            config
                .local_font_dir
                .as_ref()
                .map_or_else(|| "none".to_string(), |d| d.display().to_string())
        ),
        format!("configured fonts: {}", config.configured_fonts.len()),
        format!("default family: {}", config.default_family),
        format!("weight matching: {}", config.weight_matching),
    ];
    if let Some(limit) = config.resolve_timeout() {
        lines.push(format!("resolve timeout: {:?}", limit));
    }
    lines.join("\n")
}
