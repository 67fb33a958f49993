//! Services the renderer consults but does not own.
//!
//! The host site generator supplies these: a store that knows posts and their
//! assets, a URL builder aware of the site root, and an HTML sanitizer. Each
//! trait comes with a default implementation so the renderer works standalone.
use std::{collections::HashMap, sync::LazyLock};

use ammonia::Builder as AmmoniaBuilder;
use regex::Regex;

use crate::{links::has_scheme, options::SanitizeOptions, utils::never_matching_regex};

static DUPLICATE_SLASH_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"/{2,}").unwrap_or_else(|e| {
    log::error!("Failed to compile DUPLICATE_SLASH_RE regex: {e}");
    never_matching_regex()
  })
});

/// A post known to the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
  pub slug:       String,
  pub path:       String,
  /// Source-relative path of the post's asset folder.
  pub source_dir: String,
}

/// An asset belonging to a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
  /// Canonical site path of the asset.
  pub path: String,
}

/// Lookup of posts and their assets.
///
/// A miss is not an error: the renderer keeps the original reference.
pub trait AssetStore: Send + Sync {
  /// Find the post generated from `path`, relative to the source directory
  /// and using forward slashes.
  fn find_post_by_source_path(&self, path: &str) -> Option<PostRecord>;

  /// Find an asset by its `{post asset folder}/{relative path}` key.
  fn find_asset_by_key(&self, key: &str) -> Option<AssetRecord>;
}

/// In-memory [`AssetStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
  posts:  HashMap<String, PostRecord>,
  assets: HashMap<String, AssetRecord>,
}

impl MemoryAssetStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a post under its source path.
  pub fn insert_post(
    &mut self,
    source_path: impl Into<String>,
    post: PostRecord,
  ) -> &mut Self {
    self.posts.insert(source_path.into(), post);
    self
  }

  /// Register an asset under its lookup key.
  pub fn insert_asset(
    &mut self,
    key: impl Into<String>,
    asset: AssetRecord,
  ) -> &mut Self {
    self.assets.insert(key.into(), asset);
    self
  }
}

impl AssetStore for MemoryAssetStore {
  fn find_post_by_source_path(&self, path: &str) -> Option<PostRecord> {
    self.posts.get(path).cloned()
  }

  fn find_asset_by_key(&self, key: &str) -> Option<AssetRecord> {
    self.assets.get(key).cloned()
  }
}

/// Builds site URLs for root-relative paths.
pub trait UrlResolver: Send + Sync {
  /// Prefix `path` with the site root. Fragments, protocol-relative URLs and
  /// URLs with a scheme are returned unchanged.
  fn url_for(&self, path: &str) -> String;
}

/// [`UrlResolver`] that prepends a fixed root path.
#[derive(Debug, Clone)]
pub struct RootUrlResolver {
  root: String,
}

impl RootUrlResolver {
  /// Create a resolver for `root`, normalized to `/…/`.
  #[must_use]
  pub fn new(root: &str) -> Self {
    let trimmed = root.trim().trim_matches('/');
    let root = if trimmed.is_empty() {
      "/".to_string()
    } else {
      format!("/{trimmed}/")
    };
    Self { root }
  }

  #[must_use]
  pub fn root(&self) -> &str {
    &self.root
  }
}

impl Default for RootUrlResolver {
  fn default() -> Self {
    Self::new("/")
  }
}

impl UrlResolver for RootUrlResolver {
  fn url_for(&self, path: &str) -> String {
    if path.starts_with('#') || path.starts_with("//") || has_scheme(path) {
      return path.to_string();
    }

    let joined = format!("{}{path}", self.root);
    DUPLICATE_SLASH_RE.replace_all(&joined, "/").into_owned()
  }
}

/// Cleans rendered HTML.
pub trait Sanitizer: Send + Sync {
  fn sanitize(&self, html: &str, options: &SanitizeOptions) -> String;
}

/// Tags whose content ammonia drops entirely; they can never be allowed.
const CLEAN_CONTENT_TAGS: [&str; 2] = ["script", "style"];

/// Tags that carry attributes in the default allow-list.
const ATTRIBUTE_TAGS: [&str; 8] =
  ["a", "img", "input", "li", "ol", "td", "th", "col"];

/// [`Sanitizer`] backed by `ammonia`.
///
/// The default allow-list keeps everything the renderer emits: heading ids
/// and header links, `target`/`rel` on links, lazy-loading images, figure
/// captions and to-do checkboxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmmoniaSanitizer;

impl AmmoniaSanitizer {
  fn builder(options: &SanitizeOptions) -> AmmoniaBuilder<'_> {
    let mut builder = AmmoniaBuilder::default();
    builder.link_rel(None);

    builder.add_tags(&["input", "figure", "figcaption"]);
    builder.add_generic_attributes(&["id", "class", "title", "aria-hidden"]);
    builder.add_tag_attributes("a", &["target", "rel"]);
    builder.add_tag_attributes("img", &["alt", "title", "loading"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("li", &["style"]);

    let add_tags: Vec<&str> = options
      .add_tags
      .iter()
      .map(String::as_str)
      .filter(|tag| {
        let blocked = CLEAN_CONTENT_TAGS.contains(tag);
        if blocked {
          log::warn!("Sanitizer cannot allow <{tag}>, ignoring");
        }
        !blocked
      })
      .collect();
    builder.add_tags(add_tags);
    builder.rm_tags(options.forbid_tags.iter().map(String::as_str));

    builder.add_generic_attributes(options.add_attr.iter().map(String::as_str));
    builder.rm_generic_attributes(options.forbid_attr.iter().map(String::as_str));
    for tag in ATTRIBUTE_TAGS {
      builder.rm_tag_attributes(tag, options.forbid_attr.iter().map(String::as_str));
    }

    builder
  }
}

impl Sanitizer for AmmoniaSanitizer {
  fn sanitize(&self, html: &str, options: &SanitizeOptions) -> String {
    Self::builder(options).clean(html).to_string()
  }
}
