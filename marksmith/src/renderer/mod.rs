//! Node renderer: the table of handlers that turn AST nodes into HTML.
//!
//! Every overridable node kind has one handler field. Handlers are plain
//! closures behind an [`Arc`], so a hook can replace one or wrap the previous
//! handler by cloning it first:
//!
//! ```
//! use std::sync::Arc;
//!
//! use marksmith::renderer::NodeRenderer;
//!
//! let mut renderer = NodeRenderer::new();
//! let previous = Arc::clone(&renderer.paragraph);
//! renderer.set_paragraph(move |scope, text| {
//!   format!("<div class=\"para\">{}</div>", previous(scope, text))
//! });
//! ```
pub mod handlers;
mod scope;
mod tokenizer;
pub(crate) mod walk;

use std::{fmt, sync::Arc};

pub use scope::{RenderContext, Scope};
pub use tokenizer::{InlineTextHandler, Tokenizer};

use crate::anchor::HeadingIdTable;

/// Handler for a node described by `N`.
pub type NodeHandler<N> =
  Arc<dyn Fn(&mut Scope<'_>, &N) -> String + Send + Sync>;

/// Handler for a block whose content is already-rendered HTML.
pub type BodyHandler = Arc<dyn Fn(&mut Scope<'_>, &str) -> String + Send + Sync>;

/// Handler for a line break.
pub type BreakHandler = Arc<dyn Fn(&mut Scope<'_>) -> String + Send + Sync>;

/// A heading. `text` is the rendered inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
  pub level: u8,
  pub text:  String,
}

/// A link. `href` and `title` are raw, `text` is rendered inline HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkNode {
  pub href:  String,
  pub title: Option<String>,
  pub text:  String,
}

/// An image. `text` is the escaped alt text, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
  pub href:  String,
  pub title: Option<String>,
  pub text:  Option<String>,
}

/// A fenced or indented code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeNode {
  /// First word of the info string.
  pub lang: Option<String>,
  pub code: String,
}

/// The per-render handler table.
///
/// A fresh instance, with a fresh [`HeadingIdTable`], is built for every
/// render call.
pub struct NodeRenderer {
  pub heading:   NodeHandler<HeadingNode>,
  pub link:      NodeHandler<LinkNode>,
  pub image:     NodeHandler<ImageNode>,
  pub code:      NodeHandler<CodeNode>,
  pub paragraph: BodyHandler,
  pub list_item: BodyHandler,
  pub br:        BreakHandler,

  heading_ids: HeadingIdTable,
}

impl NodeRenderer {
  /// Create a renderer with the default handlers.
  #[must_use]
  pub fn new() -> Self {
    Self {
      heading:     Arc::new(handlers::heading),
      link:        Arc::new(handlers::link),
      image:       Arc::new(handlers::image),
      code:        Arc::new(handlers::code),
      paragraph:   Arc::new(handlers::paragraph),
      list_item:   Arc::new(handlers::list_item),
      br:          Arc::new(handlers::br),
      heading_ids: HeadingIdTable::new(),
    }
  }

  pub fn set_heading<F>(&mut self, handler: F)
  where
    F: Fn(&mut Scope<'_>, &HeadingNode) -> String + Send + Sync + 'static,
  {
    self.heading = Arc::new(handler);
  }

  pub fn set_link<F>(&mut self, handler: F)
  where
    F: Fn(&mut Scope<'_>, &LinkNode) -> String + Send + Sync + 'static,
  {
    self.link = Arc::new(handler);
  }

  pub fn set_image<F>(&mut self, handler: F)
  where
    F: Fn(&mut Scope<'_>, &ImageNode) -> String + Send + Sync + 'static,
  {
    self.image = Arc::new(handler);
  }

  pub fn set_code<F>(&mut self, handler: F)
  where
    F: Fn(&mut Scope<'_>, &CodeNode) -> String + Send + Sync + 'static,
  {
    self.code = Arc::new(handler);
  }

  pub fn set_paragraph<F>(&mut self, handler: F)
  where
    F: Fn(&mut Scope<'_>, &str) -> String + Send + Sync + 'static,
  {
    self.paragraph = Arc::new(handler);
  }

  pub fn set_list_item<F>(&mut self, handler: F)
  where
    F: Fn(&mut Scope<'_>, &str) -> String + Send + Sync + 'static,
  {
    self.list_item = Arc::new(handler);
  }

  pub fn set_br<F>(&mut self, handler: F)
  where
    F: Fn(&mut Scope<'_>) -> String + Send + Sync + 'static,
  {
    self.br = Arc::new(handler);
  }

  /// Anchors issued so far in this render.
  #[must_use]
  pub const fn heading_ids(&self) -> &HeadingIdTable {
    &self.heading_ids
  }

  pub fn render_heading(
    &mut self,
    ctx: &RenderContext<'_>,
    node: &HeadingNode,
  ) -> String {
    let mut scope = Scope {
      ctx,
      heading_ids: &mut self.heading_ids,
    };
    (self.heading)(&mut scope, node)
  }

  pub fn render_link(&mut self, ctx: &RenderContext<'_>, node: &LinkNode) -> String {
    let mut scope = Scope {
      ctx,
      heading_ids: &mut self.heading_ids,
    };
    (self.link)(&mut scope, node)
  }

  pub fn render_image(
    &mut self,
    ctx: &RenderContext<'_>,
    node: &ImageNode,
  ) -> String {
    let mut scope = Scope {
      ctx,
      heading_ids: &mut self.heading_ids,
    };
    (self.image)(&mut scope, node)
  }

  pub fn render_code(&mut self, ctx: &RenderContext<'_>, node: &CodeNode) -> String {
    let mut scope = Scope {
      ctx,
      heading_ids: &mut self.heading_ids,
    };
    (self.code)(&mut scope, node)
  }

  pub fn render_paragraph(&mut self, ctx: &RenderContext<'_>, text: &str) -> String {
    let mut scope = Scope {
      ctx,
      heading_ids: &mut self.heading_ids,
    };
    (self.paragraph)(&mut scope, text)
  }

  pub fn render_list_item(&mut self, ctx: &RenderContext<'_>, text: &str) -> String {
    let mut scope = Scope {
      ctx,
      heading_ids: &mut self.heading_ids,
    };
    (self.list_item)(&mut scope, text)
  }

  pub fn render_br(&mut self, ctx: &RenderContext<'_>) -> String {
    let mut scope = Scope {
      ctx,
      heading_ids: &mut self.heading_ids,
    };
    (self.br)(&mut scope)
  }
}

impl Default for NodeRenderer {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for NodeRenderer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NodeRenderer")
      .field("heading_ids", &self.heading_ids)
      .finish_non_exhaustive()
  }
}
