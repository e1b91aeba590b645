use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use eyre::{Context, Result};
use serde::Deserialize;

use crate::badge::BadgeStyle;
use crate::dates::DateParser;
use crate::debounce::MaxWaitPolicy;

pub static PROJECT_DIR: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("org", "stockroom-project", "stockroom"));
const CONFIG_FILE: &str = "config.toml";
pub const LOCAL_DIR: &str = ".stockroom";

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    pub table: TableSettings,
    pub search: SearchSettings,
    pub status: StatusSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableSettings {
    pub default_page_size: usize,
    /// Choices offered by a page size picker.
    pub page_size_options: Vec<usize>,
    pub pagination_enabled: bool,
    pub selection_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchSettings {
    /// Quiet period before a global search query is applied.
    pub debounce_ms: u64,
    /// Forces a query through while typing continues.
    #[serde(default)]
    pub max_wait_ms: Option<u64>,
    #[serde(default)]
    pub max_wait_policy: MaxWaitPolicy,
    /// chrono format strings tried in order. Empty means the built-in list.
    #[serde(default)]
    pub date_formats: Vec<String>,
}

impl SearchSettings {
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn date_parser(&self) -> DateParser {
        DateParser::with_formats(self.date_formats.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusSettings {
    #[serde(default)]
    pub badges: BTreeMap<String, BadgeStyle>,
    /// Status → color class.
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    pub default_color: String,
}

impl ExplorerConfig {
    /// Loads the embedded defaults, then the user config file, local
    /// `.stockroom` directories from the outermost inward, and finally
    /// `STOCKROOM_*` environment variables. `force_default_config` skips
    /// everything but the defaults.
    pub fn new(force_default_config: bool) -> Result<Self> {
        let default_config = include_str!("../default_config.toml");

        let mut config = Config::builder().add_source(config::File::from_str(
            default_config,
            config::FileFormat::Toml,
        ));

        let config = if force_default_config {
            config
        } else {
            if let Some(proj_dirs) = &*PROJECT_DIR {
                let config_file = proj_dirs.config_dir().join(CONFIG_FILE);
                config = config.add_source(File::from(config_file).required(false));
            }

            find_local_configs()
                .into_iter()
                .fold(config, |c, p| {
                    c.add_source(File::from(p.join(CONFIG_FILE)).required(false))
                })
                .add_source(
                    Environment::with_prefix("stockroom")
                        .separator("__")
                        .try_parsing(true),
                )
        };

        config
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn new_from_toml(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }
}

/// Finds `.stockroom` directories from the current directory up to the root,
/// outermost first. Any failure yields an empty list.
fn find_local_configs() -> Vec<PathBuf> {
    match std::env::current_dir() {
        Ok(dir) => search_upward(dir, "/", LOCAL_DIR)
            .into_iter()
            .filter(|p| p.is_dir())
            .rev()
            .collect(),
        Err(_) => vec![],
    }
}

fn search_upward(
    start: impl AsRef<Path>,
    end: impl AsRef<Path>,
    item: impl AsRef<Path>,
) -> Vec<PathBuf> {
    start
        .as_ref()
        .ancestors()
        .take_while(|p| p.starts_with(end.as_ref()))
        .map(|p| p.join(&item))
        .filter(|p| p.try_exists().is_ok_and(std::convert::identity))
        .collect()
}
