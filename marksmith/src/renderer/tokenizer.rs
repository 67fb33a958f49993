use std::{fmt, sync::Arc};

use comrak::options::Options;

use crate::{options::RenderConfig, smartypants::smartypants, utils::escape_html};

/// Handler for plain inline text runs. Receives raw text and returns HTML.
pub type InlineTextHandler =
  Arc<dyn Fn(&str, &RenderConfig) -> String + Send + Sync>;

/// Parse-side settings plus the inline text handler.
///
/// The grammar itself is comrak's; this only decides which of its extensions
/// are active and how text runs are turned into HTML.
#[derive(Clone)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "One switch per parser extension"
)]
pub struct Tokenizer {
  pub table:         bool,
  pub strikethrough: bool,
  /// Bare URL and email autolinks.
  pub autolink:      bool,
  pub footnotes:     bool,
  pub superscript:   bool,
  pub inline_text:   InlineTextHandler,
}

impl Tokenizer {
  /// Derive the parser settings from the resolved options.
  ///
  /// `pedantic` turns every extension off; `gfm` gates tables,
  /// strikethrough and autolinks.
  #[must_use]
  pub fn new(config: &RenderConfig) -> Self {
    let gfm = config.gfm && !config.pedantic;
    Self {
      table:         gfm,
      strikethrough: gfm,
      autolink:      gfm && config.autolink,
      footnotes:     !config.pedantic,
      superscript:   false,
      inline_text:   Arc::new(inline_text),
    }
  }

  pub fn set_inline_text<F>(&mut self, handler: F)
  where
    F: Fn(&str, &RenderConfig) -> String + Send + Sync + 'static,
  {
    self.inline_text = Arc::new(handler);
  }

  /// Render one text run through the inline text handler.
  #[must_use]
  pub fn render_text(&self, text: &str, config: &RenderConfig) -> String {
    (self.inline_text)(text, config)
  }

  /// Build comrak options for these settings.
  #[must_use]
  pub fn comrak_options(&self) -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = self.table;
    options.extension.strikethrough = self.strikethrough;
    options.extension.autolink = self.autolink;
    options.extension.footnotes = self.footnotes;
    options.extension.superscript = self.superscript;
    // Checkbox items are rendered by the list item handler.
    options.extension.tasklist = false;
    options.extension.description_lists = false;
    options.extension.header_ids = None;
    options.render.r#unsafe = true;
    options
  }
}

impl fmt::Debug for Tokenizer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Tokenizer")
      .field("table", &self.table)
      .field("strikethrough", &self.strikethrough)
      .field("autolink", &self.autolink)
      .field("footnotes", &self.footnotes)
      .field("superscript", &self.superscript)
      .finish_non_exhaustive()
  }
}

/// Default inline text handler: smart punctuation when enabled, then HTML
/// escaping.
#[must_use]
pub fn inline_text(text: &str, config: &RenderConfig) -> String {
  if config.smartypants {
    escape_html(&smartypants(text, &config.quotes)).into_owned()
  } else {
    escape_html(text).into_owned()
  }
}
