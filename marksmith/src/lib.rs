//! # marksmith
//!
//! Markdown to HTML rendering for static site generators. Parsing is done by
//! `comrak`; every node kind a site may want to customize goes through an
//! overridable handler that applies the site's conventions:
//!
//! - **Stable heading anchors** with per-render duplicate numbering
//! - **Link rewriting**: unsafe scheme blocking, external link attributes,
//!   root prefixing and URL encoding
//! - **Image rewriting** with post asset folder lookup, lazy loading and
//!   figure captions
//! - **Code highlighting** through `syntect` grammars
//! - **Smart punctuation** and **description lists**
//! - **Sanitization** of the final HTML through `ammonia`
//! - **Error recovery**: a render never fails, it degrades to escaped text
//!
//! ## Quick Start
//!
//! ```rust
//! use marksmith::{Document, MarkedOptions, MarkedRenderer, SiteContext};
//!
//! let renderer = MarkedRenderer::new(SiteContext::default());
//! let html = renderer.render(&Document::new("# Hello world"), None);
//! assert!(html.starts_with(r#"<h1 id="Hello-world">"#));
//!
//! // Per-call options are layered over the renderer's own.
//! let overrides = MarkedOptions {
//!   header_ids: Some(false),
//!   ..Default::default()
//! };
//! let html = renderer.render(&Document::new("# Hello world"), Some(&overrides));
//! assert_eq!(html, "<h1>Hello world</h1>\n");
//! ```
pub mod anchor;
pub mod collab;
pub mod highlight;
pub mod hooks;
pub mod links;
pub mod options;
pub mod render;
pub mod renderer;
pub mod smartypants;
pub mod types;
pub mod utils;

pub use crate::{
  collab::{
    AmmoniaSanitizer,
    AssetRecord,
    AssetStore,
    MemoryAssetStore,
    PostRecord,
    RootUrlResolver,
    Sanitizer,
    UrlResolver,
  },
  hooks::{AstExtension, ExtensionRegistry},
  options::{
    ExternalLinkOptions,
    MarkedOptions,
    RenderConfig,
    SanitizeOptions,
    SanitizeSetting,
  },
  render::{MarkedRenderer, RenderError},
  renderer::{NodeRenderer, Tokenizer},
  types::{Document, SiteContext},
};
