//! Heading anchor generation.
//!
//! Turns rendered heading content into URL-fragment-safe identifiers and keeps
//! them unique within one document through a [`HeadingIdTable`].
//!
//! # Examples
//!
//! ```
//! use marksmith::anchor::{AnchorTransform, HeadingIdTable, allocate};
//!
//! let mut table = HeadingIdTable::new();
//! assert_eq!(allocate("Hello world", AnchorTransform::None, &mut table), "Hello-world");
//! assert_eq!(allocate("Hello world", AnchorTransform::None, &mut table), "Hello-world-1");
//! assert_eq!(allocate("中文", AnchorTransform::None, &mut table), "中文");
//! ```
use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::{never_matching_regex, strip_html, unescape_html};

/// Separator placed between the words of a slug.
pub const SEPARATOR: &str = "-";

static SPECIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"[\s~`!@#$%^&*()\-_+=\[\]{}|\\;:"'<>,.?/]+"#).unwrap_or_else(
    |e| {
      log::error!("Failed to compile SPECIAL_RE regex: {e}");
      never_matching_regex()
    },
  )
});

static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"[\x00-\x1F\x7F]").unwrap_or_else(|e| {
    log::error!("Failed to compile CONTROL_RE regex: {e}");
    never_matching_regex()
  })
});

/// Case transformation applied to generated anchors (`modifyAnchors`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnchorTransform {
  /// Keep the heading's own casing.
  #[default]
  None,
  /// Lowercase the anchor.
  Lower,
  /// Uppercase the anchor.
  Upper,
}

impl AnchorTransform {
  /// Numeric form used in configuration files (0, 1, 2).
  #[must_use]
  pub const fn as_u8(self) -> u8 {
    match self {
      Self::None => 0,
      Self::Lower => 1,
      Self::Upper => 2,
    }
  }

  /// Interpret a loosely typed configuration value.
  ///
  /// Anything that is not recognizably 1 or 2 reads as [`Self::None`].
  #[must_use]
  pub fn from_value(value: &serde_json::Value) -> Self {
    use serde_json::Value;

    match value {
      Value::Number(n) => {
        match n.as_i64() {
          Some(1) => Self::Lower,
          Some(2) => Self::Upper,
          _ => Self::None,
        }
      },
      Value::String(s) => {
        match s.trim().to_ascii_lowercase().as_str() {
          "1" | "lower" | "lowercase" => Self::Lower,
          "2" | "upper" | "uppercase" => Self::Upper,
          _ => Self::None,
        }
      },
      _ => Self::None,
    }
  }

  fn apply(self, slug: String) -> String {
    match self {
      Self::None => slug,
      Self::Lower => slug.to_lowercase(),
      Self::Upper => slug.to_uppercase(),
    }
  }
}

impl Serialize for AnchorTransform {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(self.as_u8())
  }
}

impl<'de> Deserialize<'de> for AnchorTransform {
  fn deserialize<D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Self, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(Self::from_value(&value))
  }
}

/// Per-document table of issued anchors.
///
/// Maps a candidate anchor to the suffix the next colliding heading receives.
/// One table belongs to exactly one render; sharing it across documents would
/// make unrelated headings collide.
#[derive(Debug, Clone, Default)]
pub struct HeadingIdTable {
  seen: HashMap<String, usize>,
}

impl HeadingIdTable {
  /// Create an empty table.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Reserve `candidate`, suffixing it with `-N` when it was seen before.
  ///
  /// The first occurrence is returned unchanged, the second gets `-1`, the
  /// third `-2` and so on. An empty candidate is returned as-is and not
  /// recorded.
  pub fn allocate(&mut self, candidate: String) -> String {
    if candidate.is_empty() {
      return candidate;
    }

    if let Some(counter) = self.seen.get_mut(&candidate) {
      let id = format!("{candidate}{SEPARATOR}{counter}");
      *counter += 1;
      id
    } else {
      self.seen.insert(candidate.clone(), 1);
      candidate
    }
  }

  /// Number of distinct candidates seen so far.
  #[must_use]
  pub fn len(&self) -> usize {
    self.seen.len()
  }

  /// Whether no anchor has been allocated yet.
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.seen.is_empty()
  }
}

/// Convert free text into an anchor slug.
///
/// Whitespace and ASCII punctuation runs collapse into a single `-`, control
/// characters are dropped and leading or trailing separators are trimmed.
/// Non-ASCII letters pass through untouched.
#[must_use]
pub fn slugify(text: &str, transform: AnchorTransform) -> String {
  let separated = SPECIAL_RE.replace_all(text, SEPARATOR);
  let cleaned = CONTROL_RE.replace_all(&separated, "");

  let mut slug = String::with_capacity(cleaned.len());
  for part in cleaned.split(SEPARATOR).filter(|part| !part.is_empty()) {
    if !slug.is_empty() {
      slug.push_str(SEPARATOR);
    }
    slug.push_str(part);
  }

  transform.apply(slug)
}

/// Build the anchor candidate for rendered heading content.
///
/// Markup is stripped and character references decoded before slugifying.
#[must_use]
pub fn anchor_id(content: &str, transform: AnchorTransform) -> String {
  let plain = strip_html(content);
  let plain = unescape_html(&plain);
  slugify(plain.trim(), transform)
}

/// Allocate a unique anchor for a heading within `table`.
pub fn allocate(
  content: &str,
  transform: AnchorTransform,
  table: &mut HeadingIdTable,
) -> String {
  table.allocate(anchor_id(content, transform))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_slugify_basic() {
    assert_eq!(slugify("Hello world", AnchorTransform::None), "Hello-world");
    assert_eq!(slugify("  Hello   world  ", AnchorTransform::None), "Hello-world");
  }

  #[test]
  fn test_slugify_punctuation_collapses() {
    assert_eq!(
      slugify("What's new? (v2.0)", AnchorTransform::None),
      "What-s-new-v2-0"
    );
    assert_eq!(slugify("a -- b __ c", AnchorTransform::None), "a-b-c");
    assert_eq!(slugify("---", AnchorTransform::None), "");
  }

  #[test]
  fn test_slugify_keeps_non_ascii() {
    assert_eq!(slugify("中文", AnchorTransform::None), "中文");
    assert_eq!(slugify("Überblick Ñandú", AnchorTransform::None), "Überblick-Ñandú");
  }

  #[test]
  fn test_slugify_drops_control_characters() {
    assert_eq!(slugify("a\u{0007}b", AnchorTransform::None), "ab");
  }

  #[test]
  fn test_slugify_transform() {
    assert_eq!(slugify("Example", AnchorTransform::Lower), "example");
    assert_eq!(slugify("Example", AnchorTransform::Upper), "EXAMPLE");
  }

  #[test]
  fn test_anchor_id_strips_markup() {
    assert_eq!(
      anchor_id(
        r#"<a href="https://github.com/hexojs/hexo-server">hexo-server</a>"#,
        AnchorTransform::None
      ),
      "hexo-server"
    );
    assert_eq!(
      anchor_id("<code>A</code> &amp; B", AnchorTransform::None),
      "A-B"
    );
  }

  #[test]
  fn test_table_suffixes_collisions() {
    let mut table = HeadingIdTable::new();
    assert_eq!(table.allocate("intro".to_string()), "intro");
    assert_eq!(table.allocate("intro".to_string()), "intro-1");
    assert_eq!(table.allocate("intro".to_string()), "intro-2");
    assert_eq!(table.allocate("other".to_string()), "other");
    assert_eq!(table.len(), 2);
  }

  #[test]
  fn test_table_ignores_empty_candidates() {
    let mut table = HeadingIdTable::new();
    assert_eq!(table.allocate(String::new()), "");
    assert_eq!(table.allocate(String::new()), "");
    assert!(table.is_empty());
  }

  #[test]
  fn test_fresh_tables_do_not_share_state() {
    let mut first = HeadingIdTable::new();
    let mut second = HeadingIdTable::new();
    assert_eq!(allocate("Intro", AnchorTransform::None, &mut first), "Intro");
    assert_eq!(allocate("Intro", AnchorTransform::None, &mut second), "Intro");
  }

  #[test]
  fn test_transform_from_value() {
    assert_eq!(
      AnchorTransform::from_value(&serde_json::json!(1)),
      AnchorTransform::Lower
    );
    assert_eq!(
      AnchorTransform::from_value(&serde_json::json!(2)),
      AnchorTransform::Upper
    );
    assert_eq!(
      AnchorTransform::from_value(&serde_json::json!("")),
      AnchorTransform::None
    );
    assert_eq!(
      AnchorTransform::from_value(&serde_json::json!(7)),
      AnchorTransform::None
    );
  }

  #[test]
  fn test_transform_deserializes_leniently() {
    let parsed: AnchorTransform =
      serde_json::from_str("\"upper\"").unwrap_or_default();
    assert_eq!(parsed, AnchorTransform::Upper);
    let parsed: AnchorTransform =
      serde_json::from_str("null").unwrap_or(AnchorTransform::Upper);
    assert_eq!(parsed, AnchorTransform::None);
  }
}
