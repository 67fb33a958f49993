//! Render entry point.
use std::{
  fmt,
  panic::{AssertUnwindSafe, catch_unwind},
  path::Path,
  sync::Arc,
};

use comrak::{Arena, format_html, parse_document};
use thiserror::Error;

use crate::{
  collab::{AmmoniaSanitizer, AssetStore, RootUrlResolver, Sanitizer, UrlResolver},
  hooks::{AstExtension, ExtensionRegistry},
  options::{MarkedOptions, RenderConfig},
  renderer::{NodeRenderer, RenderContext, Tokenizer, walk::Walker},
  types::{Document, SiteContext},
  utils::escape_html,
};

/// Internal render failures. None of these escape [`MarkedRenderer::render`];
/// they select the fallback output instead.
#[derive(Debug, Error)]
pub enum RenderError {
  #[error("HTML serialization failed: {0}")]
  Format(#[from] fmt::Error),

  #[error("Render panicked: {0}")]
  Panic(String),
}

/// Markdown to HTML renderer for one site.
///
/// Cheap to share between threads: every render builds its own handler
/// table, tokenizer, heading id table and parse arena.
///
/// # Examples
///
/// ```
/// use marksmith::{Document, MarkedRenderer, SiteContext};
///
/// let renderer = MarkedRenderer::new(SiteContext::default());
/// let html = renderer.render(&Document::new("# Hello world"), None);
/// assert!(html.contains(r#"<h1 id="Hello-world">"#));
/// ```
pub struct MarkedRenderer {
  site:      SiteContext,
  options:   MarkedOptions,
  hooks:     ExtensionRegistry,
  assets:    Option<Arc<dyn AssetStore>>,
  urls:      Arc<dyn UrlResolver>,
  sanitizer: Arc<dyn Sanitizer>,
}

impl MarkedRenderer {
  /// Create a renderer with default collaborators: no asset store, a root
  /// URL builder for `site.root` and the ammonia sanitizer.
  #[must_use]
  pub fn new(site: SiteContext) -> Self {
    let urls = Arc::new(RootUrlResolver::new(&site.root));
    Self {
      site,
      options: MarkedOptions::default(),
      hooks: ExtensionRegistry::new(),
      assets: None,
      urls,
      sanitizer: Arc::new(AmmoniaSanitizer),
    }
  }

  /// Set the site-level `marked` option layer.
  #[must_use]
  pub fn with_options(mut self, options: MarkedOptions) -> Self {
    self.options = options;
    self
  }

  #[must_use]
  pub fn with_asset_store(mut self, assets: Arc<dyn AssetStore>) -> Self {
    self.assets = Some(assets);
    self
  }

  #[must_use]
  pub fn with_url_resolver(mut self, urls: Arc<dyn UrlResolver>) -> Self {
    self.urls = urls;
    self
  }

  #[must_use]
  pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
    self.sanitizer = sanitizer;
    self
  }

  /// Hooks run against the fresh handler table, tokenizer and extension list
  /// of every render.
  pub const fn hooks_mut(&mut self) -> &mut ExtensionRegistry {
    &mut self.hooks
  }

  #[must_use]
  pub const fn hooks(&self) -> &ExtensionRegistry {
    &self.hooks
  }

  #[must_use]
  pub const fn site(&self) -> &SiteContext {
    &self.site
  }

  #[must_use]
  pub const fn options(&self) -> &MarkedOptions {
    &self.options
  }

  /// Resolve the options a render with `overrides` would use.
  #[must_use]
  pub fn config_for(&self, overrides: Option<&MarkedOptions>) -> RenderConfig {
    match overrides {
      Some(overrides) => self.options.merged(overrides).resolve(),
      None => self.options.resolve(),
    }
  }

  /// Render `document` to an HTML fragment.
  ///
  /// Never fails: if rendering breaks down the escaped source is returned
  /// inside a `<p>` and the error is logged.
  #[must_use]
  pub fn render(
    &self,
    document: &Document,
    overrides: Option<&MarkedOptions>,
  ) -> String {
    let config = self.config_for(overrides);

    let result = catch_unwind(AssertUnwindSafe(|| {
      self.render_with_config(document, &config)
    }))
    .unwrap_or_else(|panic| {
      let message = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
      Err(RenderError::Panic(message))
    });

    match result {
      Ok(html) => html,
      Err(e) => {
        match &document.path {
          Some(path) => {
            log::error!("Failed to render {}: {e}", path.display());
          },
          None => log::error!("Failed to render document: {e}"),
        }
        format!("<p>{}</p>\n", escape_html(&document.text))
      },
    }
  }

  /// Render with already resolved options, reporting failures.
  ///
  /// # Errors
  ///
  /// Returns [`RenderError::Format`] if comrak fails to serialize the tree.
  pub fn render_with_config(
    &self,
    document: &Document,
    config: &RenderConfig,
  ) -> Result<String, RenderError> {
    let mut renderer = NodeRenderer::new();
    let mut tokenizer = Tokenizer::new(config);
    let mut extensions: Vec<Box<dyn AstExtension>> = Vec::new();
    self.hooks.apply_renderer(&mut renderer);
    self.hooks.apply_tokenizer(&mut tokenizer);
    self.hooks.apply_extensions(&mut extensions);

    let post_path = document
      .path
      .as_deref()
      .and_then(|path| self.post_asset_base(path, config));

    let ctx = RenderContext {
      config,
      site: &self.site,
      post_path: post_path.as_deref(),
      assets: self.assets.as_deref(),
      urls: self.urls.as_ref(),
    };

    let options = tokenizer.comrak_options();
    let arena = Arena::new();
    let root = parse_document(&arena, &document.text, &options);

    for extension in &extensions {
      extension.transform(root);
    }

    Walker::new(&mut renderer, &tokenizer, &ctx, &options).walk(root)?;

    let mut html = String::new();
    format_html(root, &options, &mut html)?;

    if let Some(sanitize) = &config.sanitize {
      html = self.sanitizer.sanitize(&html, sanitize);
    }

    Ok(html)
  }

  /// Asset folder of the post generated from `path`, if post assets apply.
  fn post_asset_base(&self, path: &Path, config: &RenderConfig) -> Option<String> {
    if !(self.site.post_asset_folder && config.prepend_root && config.post_asset)
    {
      return None;
    }
    let assets = self.assets.as_deref()?;

    let source = path.to_string_lossy().replace('\\', "/");
    let source_dir = self.site.source_dir.replace('\\', "/");
    let source_dir = source_dir.trim_end_matches('/');
    let relative = source
      .strip_prefix(source_dir)
      .map_or(source.as_str(), |rest| rest.trim_start_matches('/'));

    match assets.find_post_by_source_path(relative) {
      Some(post) => Some(post.source_dir),
      None => {
        log::trace!("No post registered for source path '{relative}'");
        None
      },
    }
  }
}

impl Default for MarkedRenderer {
  fn default() -> Self {
    Self::new(SiteContext::default())
  }
}

impl fmt::Debug for MarkedRenderer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MarkedRenderer")
      .field("site", &self.site)
      .field("options", &self.options)
      .field("hooks", &self.hooks)
      .field("assets", &self.assets.is_some())
      .finish_non_exhaustive()
  }
}
