//! Smart punctuation for inline text runs.
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::{options::QuoteGlyphs, utils::never_matching_regex};

macro_rules! lazy_regex {
  ($name:ident, $pattern:expr) => {
    static $name: LazyLock<Regex> = LazyLock::new(|| {
      Regex::new($pattern).unwrap_or_else(|e| {
        log::error!(
          "Failed to compile {} regex: {e}\n Falling back to never matching \
           regex.",
          stringify!($name)
        );
        never_matching_regex()
      })
    });
  };
}

lazy_regex!(OPEN_SINGLE_RE, r#"(^|[-\u{2014}/(\[{"\s])'"#);
lazy_regex!(OPEN_DOUBLE_RE, r#"(^|[-\u{2014}/(\[{\u{2018}\s])""#);

/// Replace straight punctuation with typographic glyphs.
///
/// Dashes are handled first (`---` before `--`), then single quotes, then
/// double quotes, then ellipses. A quote at the start of the text or after
/// whitespace, a dash, a slash or an opening bracket opens; every other quote
/// closes.
///
/// # Examples
///
/// ```
/// use marksmith::{options::QuoteGlyphs, smartypants::smartypants};
///
/// assert_eq!(
///   smartypants(r#""Wait..." -- it's here"#, &QuoteGlyphs::default()),
///   "“Wait…” – it’s here"
/// );
/// ```
#[must_use]
pub fn smartypants(text: &str, quotes: &QuoteGlyphs) -> String {
  let text = text.replace("---", "\u{2014}").replace("--", "\u{2013}");

  let text = OPEN_SINGLE_RE.replace_all(&text, |caps: &Captures| {
    format!("{}{}", &caps[1], quotes.open_single)
  });
  let text = text.replace('\'', &quotes.close_single.to_string());

  let text = OPEN_DOUBLE_RE.replace_all(&text, |caps: &Captures| {
    format!("{}{}", &caps[1], quotes.open_double)
  });
  let text = text.replace('"', &quotes.close_double.to_string());

  text.replace("...", "\u{2026}")
}
