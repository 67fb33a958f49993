//! Small string helpers shared by the renderer modules.
use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"<[^>]*>").unwrap_or_else(|e| {
    log::error!("Failed to compile TAG_RE regex: {e}");
    never_matching_regex()
  })
});

/// Remove every HTML tag from `html`, keeping the text between them.
///
/// Character references are left untouched, so escaped input stays escaped.
#[must_use]
pub fn strip_html(html: &str) -> Cow<'_, str> {
  TAG_RE.replace_all(html, "")
}

/// Escape text for inclusion in HTML content or a quoted attribute.
///
/// Escapes `&`, `<`, `>`, `"` and `'`.
#[must_use]
pub fn escape_html(text: &str) -> Cow<'_, str> {
  html_escape::encode_quoted_attribute(text)
}

/// Decode HTML character references back into plain text.
#[must_use]
pub fn unescape_html(text: &str) -> Cow<'_, str> {
  html_escape::decode_html_entities(text)
}

/// Remove the indentation shared by every non-blank line of `text`.
#[must_use]
pub fn strip_indent(text: &str) -> Cow<'_, str> {
  let indent = text
    .lines()
    .filter(|line| !line.trim().is_empty())
    .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
    .min()
    .unwrap_or(0);

  if indent == 0 {
    return Cow::Borrowed(text);
  }

  let mut out = String::with_capacity(text.len());
  for line in text.split_inclusive('\n') {
    let strip = line
      .char_indices()
      .take_while(|(_, c)| c.is_whitespace() && *c != '\n')
      .take(indent)
      .last()
      .map_or(0, |(i, c)| i + c.len_utf8());
    out.push_str(&line[strip..]);
  }
  Cow::Owned(out)
}

/// Create a regex that never matches anything.
///
/// This is used as a fallback pattern when a regex fails to compile, so a
/// broken pattern degrades to "no match" instead of aborting a render.
#[must_use]
pub fn never_matching_regex() -> Regex {
  #[allow(
    clippy::expect_used,
    reason = "This pattern is guaranteed to be valid"
  )]
  Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile")
}
