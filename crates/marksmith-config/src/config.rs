use std::{
  fs,
  path::{Path, PathBuf},
};

use marksmith::{MarkedOptions, MarkedRenderer, SiteContext};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Site configuration as read from one or more config files.
///
/// Every field is optional so files can be layered: a later file only
/// replaces what it sets. Unset fields resolve to the [`SiteContext`]
/// defaults.
///
/// ```toml
/// url = "https://blog.example.com"
/// root = "/blog/"
/// post_asset_folder = true
///
/// [marked]
/// prependRoot = true
/// postAsset = true
/// external_link = { enable = true, exclude = ["github.com"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
  /// Public base URL of the site.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,

  /// Path the site is served under.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub root: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub relative_link: Option<bool>,

  /// Posts keep their assets in a folder next to the source file.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub post_asset_folder: Option<bool>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_dir: Option<String>,

  /// The site-level render option layer.
  pub marked: MarkedOptions,
}

impl SiteConfig {
  /// Load configuration from a TOML or JSON file, chosen by extension.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if its format
  /// is unsupported.
  #[allow(
    clippy::option_if_let_else,
    reason = "Clearer with explicit match on extension"
  )]
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();

    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) => {
        match ext.to_lowercase().as_str() {
          "json" => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
          "toml" => Ok(toml::from_str(&fs::read_to_string(path)?)?),
          _ => {
            Err(ConfigError::Config(format!(
              "Unsupported config file format: {}",
              path.display()
            )))
          },
        }
      },
      None => {
        Err(ConfigError::Config(format!(
          "Config file has no extension: {}",
          path.display()
        )))
      },
    }
  }

  /// Load and merge config files in order, then apply `KEY=VALUE` overrides.
  ///
  /// With no files the defaults are used.
  ///
  /// # Errors
  ///
  /// Returns an error if a file fails to load or an override is invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = Self::default();

    for config_path in config_files {
      let layer = Self::from_file(config_path).map_err(|e| {
        ConfigError::Config(format!(
          "Failed to load config from {}: {}",
          config_path.display(),
          e
        ))
      })?;
      config.merge(layer);
    }

    if config_files.len() > 1 {
      log::info!("Loaded and merged {} config files", config_files.len());
    }

    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }

    Ok(config)
  }

  /// Merge another config into this one; every field `other` sets wins.
  ///
  /// The `marked` layers are merged with [`MarkedOptions::merge`].
  pub fn merge(&mut self, other: Self) {
    if other.url.is_some() {
      self.url = other.url;
    }
    if other.root.is_some() {
      self.root = other.root;
    }
    if other.relative_link.is_some() {
      self.relative_link = other.relative_link;
    }
    if other.post_asset_folder.is_some() {
      self.post_asset_folder = other.post_asset_folder;
    }
    if other.source_dir.is_some() {
      self.source_dir = other.source_dir;
    }
    self.marked.merge(other.marked);
  }

  /// Apply configuration overrides from `KEY=VALUE` strings.
  ///
  /// Top-level keys set site fields. `marked.<option>` keys set one render
  /// option; the value is read as JSON when it parses (`false`, `2`,
  /// `{"enable": true}`) and as a plain string otherwise.
  ///
  /// # Errors
  ///
  /// Returns an error if an override is not in `KEY=VALUE` format, the key is
  /// unknown, or the value has the wrong type.
  ///
  /// # Example
  ///
  /// ```rust
  /// use marksmith_config::SiteConfig;
  ///
  /// let mut config = SiteConfig::default();
  /// config
  ///   .apply_overrides(&[
  ///     "root=/blog/".to_string(),
  ///     "marked.headerIds=false".to_string(),
  ///   ])
  ///   .expect("valid overrides");
  /// assert_eq!(config.root.as_deref(), Some("/blog/"));
  /// assert_eq!(config.marked.header_ids, Some(false));
  /// ```
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
      "url" => self.url = Some(value.to_string()),
      "root" => self.root = Some(value.to_string()),
      "source_dir" => self.source_dir = Some(value.to_string()),
      "relative_link" => self.relative_link = Some(parse_bool(key, value)?),
      "post_asset_folder" => {
        self.post_asset_folder = Some(parse_bool(key, value)?);
      },
      _ => {
        let Some(option) = key.strip_prefix("marked.") else {
          return Err(ConfigError::Config(format!(
            "Unknown config key: '{key}'"
          )));
        };
        let layer = marked_layer(option, value)?;
        log::debug!("Applying override {key}={value}");
        self.marked.merge(layer);
      },
    }

    Ok(())
  }

  /// Resolve the site fields against the defaults.
  #[must_use]
  pub fn site_context(&self) -> SiteContext {
    let defaults = SiteContext::default();
    SiteContext {
      url:               self.url.clone().unwrap_or(defaults.url),
      root:              self.root.clone().unwrap_or(defaults.root),
      relative_link:     self.relative_link.unwrap_or(defaults.relative_link),
      post_asset_folder: self
        .post_asset_folder
        .unwrap_or(defaults.post_asset_folder),
      source_dir:        self.source_dir.clone().unwrap_or(defaults.source_dir),
    }
  }

  /// Build a renderer for this site with default collaborators.
  #[must_use]
  pub fn renderer(&self) -> MarkedRenderer {
    MarkedRenderer::new(self.site_context()).with_options(self.marked.clone())
  }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  value.parse().map_err(|_| {
    ConfigError::Config(format!(
      "Invalid boolean value for '{key}': '{value}'. Expected true or false"
    ))
  })
}

/// A [`MarkedOptions`] layer with only `option` set.
fn marked_layer(option: &str, value: &str) -> Result<MarkedOptions, ConfigError> {
  let parsed = serde_json::from_str(value)
    .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

  let mut object = serde_json::Map::new();
  object.insert(option.to_string(), parsed);

  let layer: MarkedOptions = serde_json::from_value(serde_json::Value::Object(object))
    .map_err(|e| {
      ConfigError::Config(format!(
        "Invalid value for 'marked.{option}': '{value}': {e}"
      ))
    })?;

  if layer == MarkedOptions::default() {
    return Err(ConfigError::Config(format!(
      "Unknown config key: 'marked.{option}'"
    )));
  }

  Ok(layer)
}
