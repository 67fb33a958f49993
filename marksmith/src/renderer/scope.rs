use crate::{
  anchor::HeadingIdTable,
  collab::{AssetStore, UrlResolver},
  options::RenderConfig,
  types::SiteContext,
};

/// Read-only state shared by every handler during one render.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
  pub config:    &'a RenderConfig,
  pub site:      &'a SiteContext,
  /// Asset folder of the post being rendered, when it could be resolved.
  pub post_path: Option<&'a str>,
  pub assets:    Option<&'a dyn AssetStore>,
  pub urls:      &'a dyn UrlResolver,
}

/// What a handler sees while rendering one node.
///
/// The heading id table is the only mutable per-document state and belongs to
/// the current render.
pub struct Scope<'a> {
  pub ctx:         &'a RenderContext<'a>,
  pub heading_ids: &'a mut HeadingIdTable,
}

impl Scope<'_> {
  #[must_use]
  pub const fn config(&self) -> &RenderConfig {
    self.ctx.config
  }
}
