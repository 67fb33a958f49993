//! Per-render extension hooks.
//!
//! Hooks are registered once on a [`MarkedRenderer`](crate::MarkedRenderer)
//! and run on every render against freshly built state, in registration
//! order. A hook that replaces a handler therefore wins over earlier hooks
//! that replaced the same one.
use std::{fmt, sync::Arc};

use comrak::nodes::AstNode;

use crate::renderer::{NodeRenderer, Tokenizer};

/// A pass over the parsed tree, run before any handler.
pub trait AstExtension: Send + Sync {
  fn transform<'a>(&self, root: &'a AstNode<'a>);
}

type RendererHook = Arc<dyn Fn(&mut NodeRenderer) + Send + Sync>;
type TokenizerHook = Arc<dyn Fn(&mut Tokenizer) + Send + Sync>;
type ExtensionsHook = Arc<dyn Fn(&mut Vec<Box<dyn AstExtension>>) + Send + Sync>;

/// Registered hooks.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
  renderer:   Vec<RendererHook>,
  tokenizer:  Vec<TokenizerHook>,
  extensions: Vec<ExtensionsHook>,
}

impl ExtensionRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a hook that may replace or wrap node handlers.
  pub fn on_renderer<F>(&mut self, hook: F) -> &mut Self
  where
    F: Fn(&mut NodeRenderer) + Send + Sync + 'static,
  {
    self.renderer.push(Arc::new(hook));
    self
  }

  /// Register a hook that may adjust parser switches or the inline text
  /// handler.
  pub fn on_tokenizer<F>(&mut self, hook: F) -> &mut Self
  where
    F: Fn(&mut Tokenizer) + Send + Sync + 'static,
  {
    self.tokenizer.push(Arc::new(hook));
    self
  }

  /// Register a hook that may add tree passes.
  pub fn on_extensions<F>(&mut self, hook: F) -> &mut Self
  where
    F: Fn(&mut Vec<Box<dyn AstExtension>>) + Send + Sync + 'static,
  {
    self.extensions.push(Arc::new(hook));
    self
  }

  pub fn apply_renderer(&self, renderer: &mut NodeRenderer) {
    for hook in &self.renderer {
      hook(renderer);
    }
  }

  pub fn apply_tokenizer(&self, tokenizer: &mut Tokenizer) {
    for hook in &self.tokenizer {
      hook(tokenizer);
    }
  }

  pub fn apply_extensions(&self, extensions: &mut Vec<Box<dyn AstExtension>>) {
    for hook in &self.extensions {
      hook(extensions);
    }
  }

  /// Total number of registered hooks.
  #[must_use]
  pub fn len(&self) -> usize {
    self.renderer.len() + self.tokenizer.len() + self.extensions.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl fmt::Debug for ExtensionRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExtensionRegistry")
      .field("renderer", &self.renderer.len())
      .field("tokenizer", &self.tokenizer.len())
      .field("extensions", &self.extensions.len())
      .finish()
  }
}
