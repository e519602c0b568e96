use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub area_id: String,
    pub default_title: String,
    pub close_on_success: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            area_id: "poster-area-1".into(),
            default_title: String::new(),
            close_on_success: true,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    area_id: Option<String>,
    default_title: Option<String>,
    close_on_success: Option<bool>,
    log_filter: Option<String>,
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: &Path,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
    }

    apply_env(&mut settings, var)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.area_id {
        settings.area_id = v;
    }
    if let Some(v) = file_cfg.default_title {
        settings.default_title = v;
    }
    if let Some(v) = file_cfg.close_on_success {
        settings.close_on_success = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = var("POSTER__AREA_ID") {
        settings.area_id = v;
    }
    if let Some(v) = var("POSTER__DEFAULT_TITLE") {
        settings.default_title = v;
    }
    if let Some(v) = var("POSTER__CLOSE_ON_SUCCESS") {
        settings.close_on_success = parse_bool(&v)
            .with_context(|| format!("POSTER__CLOSE_ON_SUCCESS must be a boolean, got '{v}'"))?;
    }

    if let Some(v) = var("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = var("POSTER__LOG_FILTER") {
        settings.log_filter = v;
    }

    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
