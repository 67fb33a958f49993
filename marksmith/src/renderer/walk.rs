//! Drives the handler table over a parsed comrak tree.
//!
//! The walk is post-order: children are rendered first, then the parent's
//! handler receives their serialized HTML. Every node a handler renders is
//! replaced in place by a raw HTML node whose children are detached, so the
//! final comrak serialization emits handler output verbatim.
use std::sync::LazyLock;

use comrak::{
  format_html,
  nodes::{AstNode, NodeHtmlBlock, NodeValue},
  options::Options,
};
use regex::Regex;

use super::{
  CodeNode,
  HeadingNode,
  ImageNode,
  LinkNode,
  NodeRenderer,
  RenderContext,
  Tokenizer,
};
use crate::{
  render::RenderError,
  utils::{escape_html, never_matching_regex},
};

/// Opening or closing raw inline tag whose content must not get smart
/// punctuation.
static RAW_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^<(/?)(code|pre|kbd|script)(\s[^>]*)?>$").unwrap_or_else(
    |e| {
      log::error!("Failed to compile RAW_TAG_RE regex: {e}");
      never_matching_regex()
    },
  )
});

/// What the walker does with one node, read before its children change.
enum Step {
  Heading(u8),
  Link { href: String, title: Option<String> },
  Image { href: String, title: Option<String> },
  Code(CodeNode),
  Paragraph,
  Item,
  Text(String),
  SoftBreak,
  LineBreak,
  Keep,
}

pub(crate) struct Walker<'r, 'c> {
  renderer:  &'r mut NodeRenderer,
  tokenizer: &'r Tokenizer,
  ctx:       &'r RenderContext<'c>,
  options:   &'r Options<'static>,
}

impl<'r, 'c> Walker<'r, 'c> {
  pub(crate) const fn new(
    renderer: &'r mut NodeRenderer,
    tokenizer: &'r Tokenizer,
    ctx: &'r RenderContext<'c>,
    options: &'r Options<'static>,
  ) -> Self {
    Self {
      renderer,
      tokenizer,
      ctx,
      options,
    }
  }

  /// Render every node under `root`.
  pub(crate) fn walk<'a>(&mut self, root: &'a AstNode<'a>) -> Result<(), RenderError> {
    self.visit(root, false)
  }

  fn visit<'a>(&mut self, node: &'a AstNode<'a>, raw: bool) -> Result<(), RenderError> {
    let step = classify(node);

    // Image alt text is collected as plain text, not rendered.
    if !matches!(step, Step::Image { .. }) {
      let mut raw_run = raw;
      let mut child = node.first_child();
      while let Some(current) = child {
        child = current.next_sibling();
        let toggle = raw_toggle(current);
        self.visit(current, raw_run)?;
        if let Some(open) = toggle {
          raw_run = open;
        }
      }
    }

    self.apply(node, step, raw)
  }

  fn apply<'a>(
    &mut self,
    node: &'a AstNode<'a>,
    step: Step,
    raw: bool,
  ) -> Result<(), RenderError> {
    let ctx = self.ctx;

    match step {
      Step::Text(text) => {
        let html = if raw || is_autolink_text(node, &text) {
          escape_html(&text).into_owned()
        } else {
          self.tokenizer.render_text(&text, ctx.config)
        };
        replace_inline(node, html);
      },
      Step::SoftBreak => {
        if ctx.config.breaks {
          let html = self.renderer.render_br(ctx);
          replace_inline(node, html);
        }
      },
      Step::LineBreak => {
        let html = self.renderer.render_br(ctx);
        replace_inline(node, html);
      },
      Step::Heading(level) => {
        let text = self.inner_html(node)?;
        let html = self.renderer.render_heading(ctx, &HeadingNode { level, text });
        replace_block(node, html);
      },
      Step::Link { href, title } => {
        let text = self.inner_html(node)?;
        let html = self.renderer.render_link(ctx, &LinkNode { href, title, text });
        replace_inline(node, html);
      },
      Step::Image { href, title } => {
        let alt = plain_text(node);
        let text = (!alt.is_empty()).then(|| escape_html(&alt).into_owned());
        let html = self.renderer.render_image(ctx, &ImageNode { href, title, text });
        replace_inline(node, html);
      },
      Step::Code(code) => {
        let html = self.renderer.render_code(ctx, &code);
        replace_block(node, html);
      },
      Step::Paragraph => {
        let text = self.inner_html(node)?;
        let html = self.renderer.render_paragraph(ctx, &text);
        replace_block(node, html);
      },
      Step::Item => {
        let text = self.inner_html(node)?;
        let html = self.renderer.render_list_item(ctx, &text);
        replace_block(node, html);
      },
      Step::Keep => {},
    }

    Ok(())
  }

  /// Serialize the children of `node`.
  fn inner_html<'a>(&self, node: &'a AstNode<'a>) -> Result<String, RenderError> {
    let mut html = String::new();
    for child in node.children() {
      format_html(child, self.options, &mut html)?;
    }
    Ok(html)
  }
}

fn classify<'a>(node: &'a AstNode<'a>) -> Step {
  match &node.data.borrow().value {
    NodeValue::Heading(heading) => Step::Heading(heading.level),
    NodeValue::Link(link) => {
      Step::Link {
        href:  link.url.clone(),
        title: non_empty(&link.title),
      }
    },
    NodeValue::Image(link) => {
      Step::Image {
        href:  link.url.clone(),
        title: non_empty(&link.title),
      }
    },
    NodeValue::CodeBlock(block) => {
      Step::Code(CodeNode {
        lang: block.info.split_whitespace().next().map(str::to_string),
        code: block.literal.clone(),
      })
    },
    NodeValue::Paragraph if in_tight_list(node) => Step::Keep,
    NodeValue::Paragraph => Step::Paragraph,
    NodeValue::Item(_) => Step::Item,
    NodeValue::Text(text) => {
      let text: &str = text;
      Step::Text(text.to_string())
    },
    NodeValue::SoftBreak => Step::SoftBreak,
    NodeValue::LineBreak => Step::LineBreak,
    _ => Step::Keep,
  }
}

fn non_empty(value: &str) -> Option<String> {
  (!value.is_empty()).then(|| value.to_string())
}

/// Paragraphs directly inside a tight list item are rendered without `<p>`.
fn in_tight_list<'a>(node: &'a AstNode<'a>) -> bool {
  node
    .parent()
    .and_then(|item| item.parent())
    .is_some_and(|list| {
      matches!(&list.data.borrow().value, NodeValue::List(nl) if nl.tight)
    })
}

/// `Some(true)` for a raw opening tag, `Some(false)` for its closing tag.
fn raw_toggle<'a>(node: &'a AstNode<'a>) -> Option<bool> {
  match &node.data.borrow().value {
    NodeValue::HtmlInline(html) => {
      RAW_TAG_RE
        .captures(html.trim())
        .map(|caps| caps[1].is_empty())
    },
    _ => None,
  }
}

/// Text that is the visible part of an autolink, which must stay verbatim.
fn is_autolink_text<'a>(node: &'a AstNode<'a>, text: &str) -> bool {
  node.parent().is_some_and(|parent| {
    matches!(
      &parent.data.borrow().value,
      NodeValue::Link(link)
        if link.url == text || link.url.strip_prefix("mailto:") == Some(text)
    )
  })
}

fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
  let mut text = String::new();
  for descendant in node.descendants().skip(1) {
    match &descendant.data.borrow().value {
      NodeValue::Text(t) => text.push_str(t),
      NodeValue::Code(code) => text.push_str(&code.literal),
      NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
      _ => {},
    }
  }
  text
}

fn detach_children<'a>(node: &'a AstNode<'a>) {
  while let Some(child) = node.first_child() {
    child.detach();
  }
}

fn replace_inline<'a>(node: &'a AstNode<'a>, html: String) {
  detach_children(node);
  node.data.borrow_mut().value = NodeValue::HtmlInline(html);
}

fn replace_block<'a>(node: &'a AstNode<'a>, mut html: String) {
  if !html.ends_with('\n') {
    html.push('\n');
  }
  detach_children(node);
  node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
    block_type: 0,
    literal:    html,
  });
}
