//! Code block highlighting backed by `syntect`, with the extended syntax
//! definitions from `two-face`.
//!
//! Output is classed rather than themed: tokens become
//! `<span class="...">` elements and the site's stylesheet picks the
//! colors. No gutter, line numbers or wrapper element are added.
use std::sync::LazyLock;

use syntect::{
  html::{ClassStyle, ClassedHTMLGenerator},
  parsing::SyntaxSet,
  util::LinesWithEndings,
};

static SYNTAX_SET: LazyLock<SyntaxSet> =
  LazyLock::new(two_face::syntax::extra_newlines);

/// Highlight `code` as `lang`.
///
/// Returns `None` when the language is unknown or the grammar fails on the
/// input; callers fall back to escaped plain text. The returned markup is
/// already HTML-escaped.
#[must_use]
pub fn highlight(code: &str, lang: &str) -> Option<String> {
  let syntax = SYNTAX_SET.find_syntax_by_token(lang)?;
  let mut generator = ClassedHTMLGenerator::new_with_class_style(
    syntax,
    &SYNTAX_SET,
    ClassStyle::Spaced,
  );

  for line in LinesWithEndings::from(code) {
    if let Err(e) = generator.parse_html_for_line_which_includes_newline(line)
    {
      log::warn!("Failed to highlight {lang} code block: {e}");
      return None;
    }
  }

  Some(generator.finalize())
}
