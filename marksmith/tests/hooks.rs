#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]
use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};

use comrak::nodes::{AstNode, NodeValue};
use marksmith::{AstExtension, Document, MarkedRenderer, renderer::handlers};

#[test]
fn test_renderer_hook_runs_on_every_render() {
  let calls = Arc::new(AtomicUsize::new(0));
  let mut renderer = MarkedRenderer::default();
  let counter = Arc::clone(&calls);
  renderer.hooks_mut().on_renderer(move |r| {
    counter.fetch_add(1, Ordering::SeqCst);
    r.set_paragraph(|_, text| format!("<div>{text}</div>\n"));
  });

  let doc = Document::new("hello");
  assert_eq!(renderer.render(&doc, None), "<div>hello</div>\n");
  assert_eq!(renderer.render(&doc, None), "<div>hello</div>\n");
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_later_hook_wins() {
  let mut renderer = MarkedRenderer::default();
  renderer
    .hooks_mut()
    .on_renderer(|r| r.set_heading(|_, node| format!("<h{0}>first</h{0}>", node.level)))
    .on_renderer(|r| r.set_heading(|_, node| format!("<h{0}>second</h{0}>", node.level)));

  let html = renderer.render(&Document::new("## Title"), None);
  assert_eq!(html, "<h2>second</h2>\n");
}

#[test]
fn test_wrapping_default_handler_keeps_anchor_table() {
  let mut renderer = MarkedRenderer::default();
  renderer.hooks_mut().on_renderer(|r| {
    r.set_heading(|scope, node| {
      let html = handlers::heading(scope, node);
      format!("<div class=\"heading\">{html}</div>")
    });
  });

  let html = renderer.render(&Document::new("# A\n\n# A"), None);
  assert!(html.contains(r#"<div class="heading"><h1 id="A">"#));
  assert!(html.contains(r#"<div class="heading"><h1 id="A-1">"#));
}

#[test]
fn test_tokenizer_hook_replaces_inline_text() {
  let mut renderer = MarkedRenderer::default();
  renderer
    .hooks_mut()
    .on_tokenizer(|t| t.set_inline_text(|text, _| text.to_uppercase()));

  let html = renderer.render(&Document::new("shout `quiet`"), None);
  assert_eq!(html, "<p>SHOUT <code>quiet</code></p>\n");
}

#[test]
fn test_tokenizer_hook_toggles_extension() {
  let mut renderer = MarkedRenderer::default();
  renderer.hooks_mut().on_tokenizer(|t| t.strikethrough = false);

  let html = renderer.render(&Document::new("~~gone~~"), None);
  assert!(!html.contains("<del>"));
}

struct DropImages;

impl AstExtension for DropImages {
  fn transform<'a>(&self, root: &'a AstNode<'a>) {
    let images: Vec<_> = root
      .descendants()
      .filter(|node| matches!(node.data.borrow().value, NodeValue::Image(_)))
      .collect();
    for image in images {
      image.detach();
    }
  }
}

#[test]
fn test_extension_transforms_tree_before_handlers() {
  let mut renderer = MarkedRenderer::default();
  renderer
    .hooks_mut()
    .on_extensions(|list| list.push(Box::new(DropImages)));

  let html = renderer.render(&Document::new("before ![x](/x.png) after"), None);
  assert!(!html.contains("<img"));
  assert!(html.contains("before"));
  assert!(html.contains("after"));
}

#[test]
fn test_hooks_survive_clone_of_registry() {
  let mut first = MarkedRenderer::default();
  first.hooks_mut().on_renderer(|r| r.set_br(|_| "<br/>".to_string()));

  let mut second = MarkedRenderer::default();
  *second.hooks_mut() = first.hooks().clone();

  let html = second.render(&Document::new("a\nb"), None);
  assert_eq!(html, "<p>a<br/>b</p>\n");
}
