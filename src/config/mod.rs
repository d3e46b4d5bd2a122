use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::filter::DEBOUNCE_DELAY_MS;
use crate::sort::SortStrategy;


/// Directory holding the panel configuration file, relative to the project
/// root.
pub const CONFIG_DIR: &str = ".mapsift";
pub const CONFIG_FILE: &str = "config.toml";

/// Runtime capability flags for the search panel. Each flag independently
/// enables one capability; disabled capabilities degrade to no-ops, never to
/// errors.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    pub enable_filtering: bool,
    pub enable_sorting: bool,
    pub allow_clear_selection: bool,
    pub enable_download: bool,
    pub enable_hover_preview: bool,
    pub enable_feature_toggle: bool,
    /// Include the synthesized selection collection in the overview list.
    pub include_selection_collection: bool,
    /// Suppress collections with zero features from the overview list.
    pub hide_empty_collections: bool,
    pub debounce_delay_ms: u64,
    pub default_collection_sort: SortStrategy,
    pub default_feature_sort: SortStrategy,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enable_filtering: true,
            enable_sorting: true,
            allow_clear_selection: true,
            enable_download: true,
            enable_hover_preview: true,
            enable_feature_toggle: true,
            include_selection_collection: true,
            hide_empty_collections: false,
            debounce_delay_ms: DEBOUNCE_DELAY_MS,
            default_collection_sort: SortStrategy::AtoZ,
            default_feature_sort: SortStrategy::AtoZ,
        }
    }
}

/// Partial configuration as read from `.mapsift/config.toml`. Every field is
/// optional; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub enable_filtering: Option<bool>,
    pub enable_sorting: Option<bool>,
    pub allow_clear_selection: Option<bool>,
    pub enable_download: Option<bool>,
    pub enable_hover_preview: Option<bool>,
    pub enable_feature_toggle: Option<bool>,
    pub include_selection_collection: Option<bool>,
    pub hide_empty_collections: Option<bool>,
    pub debounce_delay_ms: Option<u64>,
    pub default_collection_sort: Option<SortStrategy>,
    pub default_feature_sort: Option<SortStrategy>,
}

/// Load the project configuration file, returning defaults when it does not
/// exist.
pub fn load_project_config(project_root: &Path) -> Result<FileConfig> {
    let path = project_root.join(CONFIG_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str::<FileConfig>(&s).with_context(|| format!("parse {}", path.display()))
}

impl PanelConfig {
    /// Assemble the effective configuration: defaults, then the project file,
    /// then `MAPSIFT_*` environment overrides.
    pub fn load(project_root: &Path) -> Result<Self> {
        let file_cfg = load_project_config(project_root).unwrap_or_else(|e| {
            warn!("config file ignored: {e:#}");
            FileConfig::default()
        });
        let mut cfg = Self::default();
        cfg.overlay(file_cfg);
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn overlay(&mut self, file: FileConfig) {
        if let Some(v) = file.enable_filtering {
            self.enable_filtering = v;
        }
        if let Some(v) = file.enable_sorting {
            self.enable_sorting = v;
        }
        if let Some(v) = file.allow_clear_selection {
            self.allow_clear_selection = v;
        }
        if let Some(v) = file.enable_download {
            self.enable_download = v;
        }
        if let Some(v) = file.enable_hover_preview {
            self.enable_hover_preview = v;
        }
        if let Some(v) = file.enable_feature_toggle {
            self.enable_feature_toggle = v;
        }
        if let Some(v) = file.include_selection_collection {
            self.include_selection_collection = v;
        }
        if let Some(v) = file.hide_empty_collections {
            self.hide_empty_collections = v;
        }
        if let Some(v) = file.debounce_delay_ms {
            self.debounce_delay_ms = v;
        }
        if let Some(v) = file.default_collection_sort {
            self.default_collection_sort = v;
        }
        if let Some(v) = file.default_feature_sort {
            self.default_feature_sort = v;
        }
    }

    fn apply_env(&mut self) {
        for (key, slot) in [
            ("MAPSIFT_ENABLE_FILTERING", &mut self.enable_filtering),
            ("MAPSIFT_ENABLE_SORTING", &mut self.enable_sorting),
            (
                "MAPSIFT_ALLOW_CLEAR_SELECTION",
                &mut self.allow_clear_selection,
            ),
            ("MAPSIFT_ENABLE_DOWNLOAD", &mut self.enable_download),
            (
                "MAPSIFT_ENABLE_HOVER_PREVIEW",
                &mut self.enable_hover_preview,
            ),
            (
                "MAPSIFT_ENABLE_FEATURE_TOGGLE",
                &mut self.enable_feature_toggle,
            ),
            (
                "MAPSIFT_INCLUDE_SELECTION_COLLECTION",
                &mut self.include_selection_collection,
            ),
            (
                "MAPSIFT_HIDE_EMPTY_COLLECTIONS",
                &mut self.hide_empty_collections,
            ),
        ] {
            if let Some(v) = env_flag(key) {
                *slot = v;
            }
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|v| parse_bool(&v))
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
