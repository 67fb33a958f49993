//! Render option layers.
//!
//! [`MarkedOptions`] is one partial configuration layer as it appears in a
//! site's `marked` block or in per-call overrides. Layers are merged shallowly
//! and then resolved against the built-in defaults into an immutable
//! [`RenderConfig`].
use serde::{Deserialize, Deserializer, Serialize};

use crate::anchor::AnchorTransform;

/// One configuration layer. Every field is optional; unset fields fall through
/// to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkedOptions {
  /// GitHub flavored extensions (tables, strikethrough, bare URL autolinks).
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gfm: Option<bool>,

  /// Stick to the original Markdown behavior. Disables the GFM extensions.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pedantic: Option<bool>,

  /// Render single newlines inside paragraphs as `<br>`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub breaks: Option<bool>,

  /// Accepted for compatibility; list detection is the parser's job.
  #[serde(
    rename = "smartLists",
    alias = "smart_lists",
    skip_serializing_if = "Option::is_none"
  )]
  pub smart_lists: Option<bool>,

  /// Enable the smart punctuation transform.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub smartypants: Option<bool>,

  /// Four quote glyphs: open double, close double, open single, close
  /// single.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quotes: Option<String>,

  /// Add `id` attributes and header links to headings.
  #[serde(
    rename = "headerIds",
    alias = "header_ids",
    skip_serializing_if = "Option::is_none"
  )]
  pub header_ids: Option<bool>,

  /// Case transformation for heading anchors.
  #[serde(
    rename = "modifyAnchors",
    alias = "modify_anchors",
    skip_serializing_if = "Option::is_none"
  )]
  pub modify_anchors: Option<AnchorTransform>,

  /// Use an in-page link at the start of a heading as its anchor source.
  #[serde(
    rename = "anchorAlias",
    alias = "anchor_alias",
    skip_serializing_if = "Option::is_none"
  )]
  pub anchor_alias: Option<bool>,

  /// Turn bare URLs into links.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub autolink: Option<bool>,

  /// Blank out `javascript:`, `vbscript:` and `data:` link targets.
  #[serde(
    rename = "sanitizeUrl",
    alias = "sanitize_url",
    skip_serializing_if = "Option::is_none"
  )]
  pub sanitize_url: Option<bool>,

  /// Encode autolinked email addresses as character references.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mangle: Option<bool>,

  /// Add `loading="lazy"` to images.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lazyload: Option<bool>,

  /// Wrap images that have alt text in a `<figure>` with a caption.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub figcaption: Option<bool>,

  /// Turn `Term` / `: description` paragraphs into description lists.
  #[serde(
    rename = "descriptionLists",
    alias = "description_lists",
    skip_serializing_if = "Option::is_none"
  )]
  pub description_lists: Option<bool>,

  /// Prefix relative image sources with the site root.
  #[serde(
    rename = "prependRoot",
    alias = "prepend_root",
    skip_serializing_if = "Option::is_none"
  )]
  pub prepend_root: Option<bool>,

  /// Resolve relative image sources against the post's asset folder.
  #[serde(
    rename = "postAsset",
    alias = "post_asset",
    skip_serializing_if = "Option::is_none"
  )]
  pub post_asset: Option<bool>,

  /// External link attribute settings. Replaced as a whole when merged.
  #[serde(alias = "externalLink", skip_serializing_if = "Option::is_none")]
  pub external_link: Option<ExternalLinkOptions>,

  /// Sanitize the rendered HTML. `true` uses the default allow-list, an
  /// object adjusts it.
  #[serde(alias = "sanitize", skip_serializing_if = "Option::is_none")]
  pub dompurify: Option<SanitizeSetting>,
}

macro_rules! merge_fields {
  ($target:ident, $source:ident, $($field:ident),+ $(,)?) => {
    $(
      if $source.$field.is_some() {
        $target.$field = $source.$field;
      }
    )+
  };
}

impl MarkedOptions {
  /// Create an empty layer.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Merge another layer into this one; every field `other` sets wins.
  ///
  /// The merge is shallow: `external_link` and `dompurify` are replaced as a
  /// whole rather than merged key by key.
  pub fn merge(&mut self, other: Self) {
    merge_fields!(
      self,
      other,
      gfm,
      pedantic,
      breaks,
      smart_lists,
      smartypants,
      quotes,
      header_ids,
      modify_anchors,
      anchor_alias,
      autolink,
      sanitize_url,
      mangle,
      lazyload,
      figcaption,
      description_lists,
      prepend_root,
      post_asset,
      external_link,
      dompurify,
    );
  }

  /// Return a copy of this layer with `other` merged on top.
  #[must_use]
  pub fn merged(&self, other: &Self) -> Self {
    let mut merged = self.clone();
    merged.merge(other.clone());
    merged
  }

  /// Resolve this layer against the built-in defaults.
  #[must_use]
  pub fn resolve(&self) -> RenderConfig {
    let defaults = RenderConfig::default();

    let quotes = match self.quotes.as_deref() {
      Some(raw) => {
        QuoteGlyphs::parse(raw).unwrap_or_else(|| {
          log::debug!(
            "Ignoring quotes option '{raw}': expected exactly four characters"
          );
          QuoteGlyphs::default()
        })
      },
      None => defaults.quotes,
    };

    let sanitize = match &self.dompurify {
      Some(SanitizeSetting::Toggle(true)) => Some(SanitizeOptions::default()),
      Some(SanitizeSetting::Options(options)) => Some(options.clone()),
      Some(SanitizeSetting::Toggle(false)) | None => None,
    };

    RenderConfig {
      gfm:               self.gfm.unwrap_or(defaults.gfm),
      pedantic:          self.pedantic.unwrap_or(defaults.pedantic),
      breaks:            self.breaks.unwrap_or(defaults.breaks),
      smart_lists:       self.smart_lists.unwrap_or(defaults.smart_lists),
      smartypants:       self.smartypants.unwrap_or(defaults.smartypants),
      quotes,
      header_ids:        self.header_ids.unwrap_or(defaults.header_ids),
      modify_anchors:    self.modify_anchors.unwrap_or(defaults.modify_anchors),
      anchor_alias:      self.anchor_alias.unwrap_or(defaults.anchor_alias),
      autolink:          self.autolink.unwrap_or(defaults.autolink),
      sanitize_url:      self.sanitize_url.unwrap_or(defaults.sanitize_url),
      mangle:            self.mangle.unwrap_or(defaults.mangle),
      lazyload:          self.lazyload.unwrap_or(defaults.lazyload),
      figcaption:        self.figcaption.unwrap_or(defaults.figcaption),
      description_lists: self
        .description_lists
        .unwrap_or(defaults.description_lists),
      prepend_root:      self.prepend_root.unwrap_or(defaults.prepend_root),
      post_asset:        self.post_asset.unwrap_or(defaults.post_asset),
      external_link:     self.external_link.clone().unwrap_or_default(),
      sanitize,
    }
  }
}

/// Settings for `target`/`rel` on links that leave the site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalLinkOptions {
  /// Open external links in a new tab.
  pub enable: bool,

  /// Hostnames that are never treated as external. Accepts a single string
  /// or a list.
  #[serde(deserialize_with = "string_or_list")]
  pub exclude: Vec<String>,

  /// Add `rel="noopener external nofollow noreferrer"` to external links.
  pub nofollow: bool,
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
  }

  Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
    Some(OneOrMany::One(host)) => vec![host],
    Some(OneOrMany::Many(hosts)) => hosts,
    None => Vec::new(),
  })
}

/// The `dompurify` option: either an on/off switch or allow-list tweaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SanitizeSetting {
  Toggle(bool),
  Options(SanitizeOptions),
}

/// Adjustments to the sanitizer's default allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeOptions {
  /// Extra tags to allow.
  #[serde(rename = "ADD_TAGS", alias = "add_tags")]
  pub add_tags: Vec<String>,

  /// Tags to remove even if allowed by default.
  #[serde(rename = "FORBID_TAGS", alias = "forbid_tags")]
  pub forbid_tags: Vec<String>,

  /// Extra attributes to allow on every tag.
  #[serde(rename = "ADD_ATTR", alias = "add_attr")]
  pub add_attr: Vec<String>,

  /// Attributes to strip from every tag.
  #[serde(rename = "FORBID_ATTR", alias = "forbid_attr")]
  pub forbid_attr: Vec<String>,
}

/// Quote glyphs for the smart punctuation transform. Defaults to `“”‘’`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteGlyphs {
  pub open_double:  char,
  pub close_double: char,
  pub open_single:  char,
  pub close_single: char,
}

impl QuoteGlyphs {
  /// Parse a four character glyph string. Any other length yields `None`.
  #[must_use]
  pub fn parse(raw: &str) -> Option<Self> {
    let mut chars = raw.chars();
    let glyphs = Self {
      open_double:  chars.next()?,
      close_double: chars.next()?,
      open_single:  chars.next()?,
      close_single: chars.next()?,
    };
    chars.next().is_none().then_some(glyphs)
  }
}

impl Default for QuoteGlyphs {
  fn default() -> Self {
    Self {
      open_double:  '“',
      close_double: '”',
      open_single:  '‘',
      close_single: '’',
    }
  }
}

/// Fully resolved options for one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Mirrors the flat option set of the configuration block"
)]
pub struct RenderConfig {
  pub gfm:               bool,
  pub pedantic:          bool,
  pub breaks:            bool,
  pub smart_lists:       bool,
  pub smartypants:       bool,
  pub quotes:            QuoteGlyphs,
  pub header_ids:        bool,
  pub modify_anchors:    AnchorTransform,
  pub anchor_alias:      bool,
  pub autolink:          bool,
  pub sanitize_url:      bool,
  pub mangle:            bool,
  pub lazyload:          bool,
  pub figcaption:        bool,
  pub description_lists: bool,
  pub prepend_root:      bool,
  pub post_asset:        bool,
  pub external_link:     ExternalLinkOptions,

  /// Sanitizer settings; `None` leaves the HTML untouched.
  pub sanitize: Option<SanitizeOptions>,
}

impl Default for RenderConfig {
  fn default() -> Self {
    Self {
      gfm:               true,
      pedantic:          false,
      breaks:            true,
      smart_lists:       true,
      smartypants:       true,
      quotes:            QuoteGlyphs::default(),
      header_ids:        true,
      modify_anchors:    AnchorTransform::None,
      anchor_alias:      false,
      autolink:          true,
      sanitize_url:      false,
      mangle:            false,
      lazyload:          false,
      figcaption:        false,
      description_lists: true,
      prepend_root:      false,
      post_asset:        false,
      external_link:     ExternalLinkOptions::default(),
      sanitize:          None,
    }
  }
}
