//! Input types for a render call.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A Markdown document to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
  /// Markdown source.
  pub text: String,

  /// Location of the source file, used for post asset resolution.
  pub path: Option<PathBuf>,
}

impl Document {
  /// Create a document without a source path.
  #[must_use]
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      path: None,
    }
  }

  /// Attach the source file path.
  #[must_use]
  pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.path = Some(path.into());
    self
  }
}

/// Site-wide settings the renderer consults for link and image rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteContext {
  /// Public base URL of the site, e.g. `https://example.com/blog`.
  pub url: String,

  /// Path the site is served under.
  pub root: String,

  /// Emit links relative to the current page instead of root-prefixed ones.
  pub relative_link: bool,

  /// Posts keep their assets in a folder next to the source file.
  pub post_asset_folder: bool,

  /// Directory source paths are relative to.
  pub source_dir: String,
}

impl Default for SiteContext {
  fn default() -> Self {
    Self {
      url:               "http://example.com".to_string(),
      root:              "/".to_string(),
      relative_link:     false,
      post_asset_folder: false,
      source_dir:        "source".to_string(),
    }
  }
}

impl SiteContext {
  /// The root path with exactly one leading and one trailing slash.
  #[must_use]
  pub fn normalized_root(&self) -> String {
    let trimmed = self.root.trim().trim_matches('/');
    if trimmed.is_empty() {
      "/".to_string()
    } else {
      format!("/{trimmed}/")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalized_root() {
    let mut site = SiteContext::default();
    assert_eq!(site.normalized_root(), "/");

    site.root = "blog".to_string();
    assert_eq!(site.normalized_root(), "/blog/");

    site.root = "/blog/".to_string();
    assert_eq!(site.normalized_root(), "/blog/");

    site.root = String::new();
    assert_eq!(site.normalized_root(), "/");
  }

  #[test]
  fn test_document_builder() {
    let doc = Document::new("# Title").with_path("source/_posts/a.md");
    assert_eq!(doc.text, "# Title");
    assert_eq!(doc.path, Some(PathBuf::from("source/_posts/a.md")));
  }
}
