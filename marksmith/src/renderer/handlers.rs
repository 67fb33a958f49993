//! Default node handlers.
//!
//! These are installed by [`NodeRenderer::new`](super::NodeRenderer::new) and
//! stay public so a replacement handler can fall back to them.
use std::{fmt::Write, sync::LazyLock};

use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use super::{CodeNode, HeadingNode, ImageNode, LinkNode, Scope};
use crate::{
  anchor,
  highlight,
  links::{encode_url, external_link_attrs, is_external_link, is_unsafe_url, mangle},
  utils::{escape_html, never_matching_regex, strip_html, strip_indent, unescape_html},
};

static ANCHOR_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r##"(?s)^<a\s+href="#([^"]+)"[^>]*>(.*)</a>$"##).unwrap_or_else(|e| {
    log::error!("Failed to compile ANCHOR_ALIAS_RE regex: {e}");
    never_matching_regex()
  })
});

/// Term, line break, colon, whitespace, description.
static DESCRIPTION_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(^|\s)(\S.+)(<br>:(\s+))(\S.+)").unwrap_or_else(|e| {
    log::error!("Failed to compile DESCRIPTION_LIST_RE regex: {e}");
    never_matching_regex()
  })
});

static TODO_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*\[[x ]\]\s*").unwrap_or_else(|e| {
    log::error!("Failed to compile TODO_RE regex: {e}");
    never_matching_regex()
  })
});

static TODO_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*\[ \]\s*").unwrap_or_else(|e| {
    log::error!("Failed to compile TODO_OPEN_RE regex: {e}");
    never_matching_regex()
  })
});

static TODO_DONE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*\[x\]\s*").unwrap_or_else(|e| {
    log::error!("Failed to compile TODO_DONE_RE regex: {e}");
    never_matching_regex()
  })
});

/// Render a heading with a unique anchor and a leading header link.
///
/// With `headerIds` off the content is wrapped in a bare `<hN>` tag. With
/// `anchorAlias` on and an in-page link as the whole content, that link's
/// fragment becomes the anchor source and is rewritten to the final anchor.
pub fn heading(scope: &mut Scope<'_>, node: &HeadingNode) -> String {
  let config = scope.ctx.config;
  let level = node.level;

  if !config.header_ids {
    return format!("<h{level}>{}</h{level}>", node.text);
  }

  let alias = if config.anchor_alias {
    ANCHOR_ALIAS_RE
      .captures(&node.text)
      .filter(|caps| !caps[2].contains("</a>"))
      .map(|caps| percent_decode_str(&caps[1]).decode_utf8_lossy().into_owned())
  } else {
    None
  };

  let source = alias.as_deref().unwrap_or(&node.text);
  let id = anchor::allocate(source, config.modify_anchors, scope.heading_ids);

  let text = if alias.is_some() {
    ANCHOR_ALIAS_RE
      .replace(&node.text, |caps: &Captures| {
        caps[0].replacen(
          &format!("href=\"#{}\"", &caps[1]),
          &format!("href=\"#{id}\""),
          1,
        )
      })
      .into_owned()
  } else {
    node.text.clone()
  };

  if id.is_empty() {
    return format!("<h{level}>{text}</h{level}>");
  }

  // Tag stripping can leave a quote behind from an attribute holding `>`.
  let title = strip_html(&text).replace('"', "&quot;");
  format!(
    "<h{level} id=\"{id}\"><a href=\"#{id}\" class=\"headerlink\" \
     title=\"{title}\"></a>{text}</h{level}>"
  )
}

/// Render a link.
///
/// Applies `sanitizeUrl`, the `autolink` switch, email mangling, URL
/// encoding and the external link attributes, in that order.
pub fn link(scope: &mut Scope<'_>, node: &LinkNode) -> String {
  let ctx = scope.ctx;
  let config = ctx.config;

  let href = if config.sanitize_url && is_unsafe_url(&node.href) {
    log::debug!("Dropping unsafe link target '{}'", node.href);
    ""
  } else {
    node.href.as_str()
  };

  if !config.autolink
    && node.title.is_none()
    && unescape_html(&node.text) == href
  {
    return node.text.clone();
  }

  let mailto = href
    .strip_prefix("mailto:")
    .filter(|address| config.mangle && unescape_html(&node.text) == *address);

  let (href_attr, text) = match mailto {
    Some(address) => (format!("mailto:{}", mangle(address)), mangle(address)),
    None => (escape_html(&encode_url(href)).into_owned(), node.text.clone()),
  };

  let mut out = format!("<a href=\"{href_attr}\"");
  if let Some(title) = &node.title {
    let _ = write!(out, " title=\"{}\"", escape_html(title));
  }
  if is_external_link(href, &ctx.site.url, &config.external_link.exclude) {
    out.push_str(external_link_attrs(&config.external_link));
  }
  let _ = write!(out, ">{text}</a>");
  out
}

/// Render an image, resolving post assets and the site root first.
pub fn image(scope: &mut Scope<'_>, node: &ImageNode) -> String {
  let ctx = scope.ctx;
  let config = ctx.config;
  let mut href = node.href.clone();

  let is_site_relative = !(href.starts_with('#')
    || href.starts_with("//")
    || href.starts_with("http:")
    || href.starts_with("https:"));

  if config.prepend_root && !ctx.site.relative_link && is_site_relative {
    if config.post_asset && !href.starts_with('/') && !href.starts_with('\\') {
      if let (Some(base), Some(assets)) = (ctx.post_path, ctx.assets) {
        let key = format!("{base}/{}", href.replace('\\', "/"));
        match assets.find_asset_by_key(&key) {
          Some(asset) => href = asset.path.replace('\\', "/"),
          None => log::trace!("No post asset for '{key}'"),
        }
      }
    }
    href = ctx.urls.url_for(&href);
  }

  let mut out = format!("<img src=\"{}\"", escape_html(&encode_url(&href)));
  if let Some(text) = &node.text {
    let _ = write!(out, " alt=\"{text}\"");
  }
  if let Some(title) = &node.title {
    let _ = write!(out, " title=\"{}\"", escape_html(title));
  }
  if config.lazyload {
    out.push_str(" loading=\"lazy\"");
  }
  out.push('>');

  match &node.text {
    Some(text) if config.figcaption => {
      format!(
        "<figure>{out}<figcaption aria-hidden=\"true\">{text}</figcaption></figure>"
      )
    },
    _ => out,
  }
}

/// Render a code block. The info string's first word becomes the `class` of
/// the `<code>` element and picks the highlighting grammar; unknown
/// languages and blocks without one are escaped as plain text.
pub fn code(_scope: &mut Scope<'_>, node: &CodeNode) -> String {
  let code = strip_indent(&node.code);
  match node.lang.as_deref() {
    Some(lang) => {
      let body = highlight::highlight(&code, lang)
        .unwrap_or_else(|| escape_html(&code).into_owned());
      format!(
        "<pre><code class=\"{}\">{body}</code></pre>\n",
        escape_html(lang)
      )
    },
    None => format!("<pre><code>{}</code></pre>\n", escape_html(&code)),
  }
}

/// Render a paragraph, turning `Term<br>: description` into a description
/// list when enabled. Only the first match is converted.
pub fn paragraph(scope: &mut Scope<'_>, text: &str) -> String {
  if scope.config().description_lists && DESCRIPTION_LIST_RE.is_match(text) {
    return DESCRIPTION_LIST_RE
      .replacen(text, 1, "<dl><dt>${2}</dt><dd>${5}</dd></dl>")
      .into_owned();
  }

  format!("<p>{text}</p>\n")
}

/// Render a list item. A leading `[ ]` or `[x]` becomes a checkbox.
pub fn list_item(_scope: &mut Scope<'_>, text: &str) -> String {
  if TODO_RE.is_match(text) {
    let body =
      TODO_OPEN_RE.replace(text, "<input type=\"checkbox\"></input> ");
    let body =
      TODO_DONE_RE.replace(&body, "<input type=\"checkbox\" checked></input> ");
    return format!("<li style=\"list-style: none\">{body}</li>\n");
  }

  format!("<li>{text}</li>\n")
}

/// Render a line break.
pub fn br(_scope: &mut Scope<'_>) -> String {
  "<br>".to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    anchor::{AnchorTransform, HeadingIdTable},
    collab::{AssetRecord, MemoryAssetStore, RootUrlResolver},
    options::{ExternalLinkOptions, RenderConfig},
    renderer::RenderContext,
    types::SiteContext,
  };

  struct Fixture {
    config: RenderConfig,
    site:   SiteContext,
    urls:   RootUrlResolver,
    assets: Option<MemoryAssetStore>,
    post:   Option<String>,
    ids:    HeadingIdTable,
  }

  impl Fixture {
    fn new() -> Self {
      Self {
        config: RenderConfig::default(),
        site:   SiteContext::default(),
        urls:   RootUrlResolver::default(),
        assets: None,
        post:   None,
        ids:    HeadingIdTable::new(),
      }
    }

    fn with<R>(&mut self, f: impl FnOnce(&mut Scope<'_>) -> R) -> R {
      let ctx = RenderContext {
        config:    &self.config,
        site:      &self.site,
        post_path: self.post.as_deref(),
        assets:    self
          .assets
          .as_ref()
          .map(|store| store as &dyn crate::collab::AssetStore),
        urls:      &self.urls,
      };
      let mut scope = Scope {
        ctx:         &ctx,
        heading_ids: &mut self.ids,
      };
      f(&mut scope)
    }
  }

  fn heading_node(text: &str) -> HeadingNode {
    HeadingNode {
      level: 1,
      text:  text.to_string(),
    }
  }

  fn link_node(href: &str, text: &str) -> LinkNode {
    LinkNode {
      href:  href.to_string(),
      title: None,
      text:  text.to_string(),
    }
  }

  fn image_node(href: &str, text: Option<&str>) -> ImageNode {
    ImageNode {
      href:  href.to_string(),
      title: None,
      text:  text.map(str::to_string),
    }
  }

  #[test]
  fn test_heading_with_anchor() {
    let mut fx = Fixture::new();
    assert_eq!(
      fx.with(|s| heading(s, &heading_node("Hello world"))),
      r##"<h1 id="Hello-world"><a href="#Hello-world" class="headerlink" title="Hello world"></a>Hello world</h1>"##
    );
  }

  #[test]
  fn test_heading_duplicates_get_suffix() {
    let mut fx = Fixture::new();
    fx.with(|s| heading(s, &heading_node("Same")));
    let second = fx.with(|s| heading(s, &heading_node("Same")));
    let third = fx.with(|s| heading(s, &heading_node("Same")));
    assert!(second.starts_with(r#"<h1 id="Same-1">"#));
    assert!(third.starts_with(r#"<h1 id="Same-2">"#));
  }

  #[test]
  fn test_heading_without_ids() {
    let mut fx = Fixture::new();
    fx.config.header_ids = false;
    fx.config.modify_anchors = AnchorTransform::Upper;
    assert_eq!(
      fx.with(|s| heading(s, &heading_node("Hello"))),
      "<h1>Hello</h1>"
    );
    assert!(fx.ids.is_empty());
  }

  #[test]
  fn test_empty_heading_is_bare() {
    let mut fx = Fixture::new();
    assert_eq!(fx.with(|s| heading(s, &heading_node(""))), "<h1></h1>");
    assert_eq!(fx.with(|s| heading(s, &heading_node("?!"))), "<h1>?!</h1>");
  }

  #[test]
  fn test_heading_title_is_plain_text() {
    let mut fx = Fixture::new();
    let html = fx.with(|s| heading(s, &heading_node("<em>Big</em> &amp; bold")));
    assert!(html.contains(r#"id="Big-bold""#));
    assert!(html.contains(r#"title="Big &amp; bold""#));
    assert!(html.ends_with("<em>Big</em> &amp; bold</h1>"));
  }

  #[test]
  fn test_heading_modify_anchors() {
    let mut fx = Fixture::new();
    fx.config.modify_anchors = AnchorTransform::Lower;
    let html = fx.with(|s| heading(s, &heading_node("Hello World")));
    assert!(html.contains(r#"id="hello-world""#));
    assert!(html.contains(r#"title="Hello World""#));
  }

  #[test]
  fn test_heading_anchor_alias() {
    let mut fx = Fixture::new();
    fx.config.anchor_alias = true;
    let text = r##"<a href="#alias">Heading</a>"##;
    let first = fx.with(|s| heading(s, &heading_node(text)));
    let second = fx.with(|s| heading(s, &heading_node(text)));

    assert_eq!(
      first,
      r##"<h1 id="alias"><a href="#alias" class="headerlink" title="Heading"></a><a href="#alias">Heading</a></h1>"##
    );
    assert!(second.contains(r#"id="alias-1""#));
    assert!(second.contains(r##"<a href="#alias-1">Heading</a>"##));
  }

  #[test]
  fn test_heading_anchor_alias_needs_sole_link() {
    let mut fx = Fixture::new();
    fx.config.anchor_alias = true;
    let text = r##"<a href="#alias">Heading</a> and more"##;
    let html = fx.with(|s| heading(s, &heading_node(text)));
    assert!(html.starts_with(r#"<h1 id="Heading-and-more">"#));
    assert!(html.contains(r##"<a href="#alias">Heading</a> and more"##));

    let text = r##"<a href="#a">A</a> <a href="#b">B</a>"##;
    let html = fx.with(|s| heading(s, &heading_node(text)));
    assert!(html.starts_with(r#"<h1 id="A-B">"#));
    assert!(html.contains(r##"<a href="#a">A</a>"##));
  }

  #[test]
  fn test_heading_title_quote_from_attribute() {
    let mut fx = Fixture::new();
    let html =
      fx.with(|s| heading(s, &heading_node(r#"Hi <span title="a>b">x</span>"#)));
    assert!(html.contains(r#"title="Hi b&quot;>x""#));
    assert!(html.ends_with(r#"Hi <span title="a>b">x</span></h1>"#));
  }

  #[test]
  fn test_link_basic_and_title() {
    let mut fx = Fixture::new();
    let mut node = link_node("/about/", "About");
    node.title = Some("The \"about\" page".to_string());
    assert_eq!(
      fx.with(|s| link(s, &node)),
      r#"<a href="/about/" title="The &quot;about&quot; page">About</a>"#
    );
  }

  #[test]
  fn test_link_sanitize_url() {
    let mut fx = Fixture::new();
    fx.config.sanitize_url = true;
    assert_eq!(
      fx.with(|s| link(s, &link_node("javascript:alert(1)", "click"))),
      r#"<a href="">click</a>"#
    );

    fx.config.sanitize_url = false;
    assert_eq!(
      fx.with(|s| link(s, &link_node("javascript:alert(1)", "click"))),
      r#"<a href="javascript:alert(1)">click</a>"#
    );
  }

  #[test]
  fn test_link_autolink_disabled() {
    let mut fx = Fixture::new();
    fx.config.autolink = false;
    assert_eq!(
      fx.with(|s| link(s, &link_node("http://hexo.io", "http://hexo.io"))),
      "http://hexo.io"
    );
    assert_eq!(
      fx.with(|s| link(s, &link_node("http://hexo.io", "Hexo"))),
      r#"<a href="http://hexo.io">Hexo</a>"#
    );
  }

  #[test]
  fn test_link_autolink_disabled_with_entities() {
    let mut fx = Fixture::new();
    fx.config.autolink = false;
    assert_eq!(
      fx.with(|s| {
        link(s, &link_node("http://a.com/?a=1&b=2", "http://a.com/?a=1&amp;b=2"))
      }),
      "http://a.com/?a=1&amp;b=2"
    );
  }

  #[test]
  fn test_link_href_is_attribute_escaped() {
    let mut fx = Fixture::new();
    assert_eq!(
      fx.with(|s| link(s, &link_node(r#"foo:a"onmouseover="alert(1)"#, "x"))),
      r#"<a href="foo:a&quot;onmouseover=&quot;alert(1)">x</a>"#
    );
    assert_eq!(
      fx.with(|s| link(s, &link_node(r#"http://a.com"x/"#, "x"))),
      r#"<a href="http://a.com&quot;x/">x</a>"#
    );
    assert_eq!(
      fx.with(|s| link(s, &link_node("/search?a=1&b=2", "x"))),
      r#"<a href="/search?a=1&amp;b=2">x</a>"#
    );
  }

  #[test]
  fn test_link_external_attributes() {
    let mut fx = Fixture::new();
    fx.config.external_link = ExternalLinkOptions {
      enable:   true,
      exclude:  vec!["baz.com".to_string()],
      nofollow: false,
    };
    assert_eq!(
      fx.with(|s| link(s, &link_node("http://bar.com/", "bar"))),
      r#"<a href="http://bar.com/" target="_blank" rel="noopener">bar</a>"#
    );
    assert_eq!(
      fx.with(|s| link(s, &link_node("http://baz.com/", "baz"))),
      r#"<a href="http://baz.com/">baz</a>"#
    );
    assert_eq!(
      fx.with(|s| link(s, &link_node("/local", "local"))),
      r#"<a href="/local">local</a>"#
    );

    fx.config.external_link.nofollow = true;
    assert_eq!(
      fx.with(|s| link(s, &link_node("http://bar.com/", "bar"))),
      r#"<a href="http://bar.com/" target="_blank" rel="noopener external nofollow noreferrer">bar</a>"#
    );
  }

  #[test]
  fn test_link_mangle() {
    let mut fx = Fixture::new();
    fx.config.mangle = true;
    let html = fx.with(|s| link(s, &link_node("mailto:a@b.c", "a@b.c")));
    assert_eq!(
      html,
      r#"<a href="mailto:&#97;&#64;&#98;&#46;&#99;">&#97;&#64;&#98;&#46;&#99;</a>"#
    );

    let html = fx.with(|s| link(s, &link_node("mailto:a@b.c", "mail me")));
    assert_eq!(html, r#"<a href="mailto:a@b.c">mail me</a>"#);
  }

  #[test]
  fn test_link_encodes_href() {
    let mut fx = Fixture::new();
    assert_eq!(
      fx.with(|s| link(s, &link_node("http://fóo.com/bár", "x"))),
      r#"<a href="http://xn--fo-5ja.com/b%C3%A1r">x</a>"#
    );
  }

  #[test]
  fn test_image_basic() {
    let mut fx = Fixture::new();
    assert_eq!(
      fx.with(|s| image(s, &image_node("/foo/bár.jpg", None))),
      r#"<img src="/foo/b%C3%A1r.jpg">"#
    );
    let mut node = image_node("/a.png", Some("alt"));
    node.title = Some("t".to_string());
    assert_eq!(
      fx.with(|s| image(s, &node)),
      r#"<img src="/a.png" alt="alt" title="t">"#
    );
  }

  #[test]
  fn test_image_src_is_attribute_escaped() {
    let mut fx = Fixture::new();
    assert_eq!(
      fx.with(|s| image(s, &image_node(r#"foo:a"onerror="alert(1)"#, None))),
      r#"<img src="foo:a&quot;onerror=&quot;alert(1)">"#
    );
    assert_eq!(
      fx.with(|s| image(s, &image_node("/a.png?w=1&h=2", None))),
      r#"<img src="/a.png?w=1&amp;h=2">"#
    );
  }

  #[test]
  fn test_image_lazyload_and_figcaption() {
    let mut fx = Fixture::new();
    fx.config.lazyload = true;
    fx.config.figcaption = true;
    assert_eq!(
      fx.with(|s| image(s, &image_node("/a.png", Some("cat")))),
      r#"<figure><img src="/a.png" alt="cat" loading="lazy"><figcaption aria-hidden="true">cat</figcaption></figure>"#
    );
    assert_eq!(
      fx.with(|s| image(s, &image_node("/a.png", None))),
      r#"<img src="/a.png" loading="lazy">"#
    );
  }

  #[test]
  fn test_image_prepend_root() {
    let mut fx = Fixture::new();
    fx.config.prepend_root = true;
    fx.site.root = "/blog/".to_string();
    fx.urls = RootUrlResolver::new("/blog/");

    assert_eq!(
      fx.with(|s| image(s, &image_node("/bar/baz.jpg", None))),
      r#"<img src="/blog/bar/baz.jpg">"#
    );
    assert_eq!(
      fx.with(|s| image(s, &image_node("http://a.com/b.jpg", None))),
      r#"<img src="http://a.com/b.jpg">"#
    );

    fx.site.relative_link = true;
    assert_eq!(
      fx.with(|s| image(s, &image_node("/bar/baz.jpg", None))),
      r#"<img src="/bar/baz.jpg">"#
    );
  }

  #[test]
  fn test_image_post_asset() {
    let mut store = MemoryAssetStore::new();
    store.insert_asset("_posts/hello/cat.jpg", AssetRecord {
      path: "2024/01/01/hello/cat.jpg".to_string(),
    });

    let mut fx = Fixture::new();
    fx.config.prepend_root = true;
    fx.config.post_asset = true;
    fx.assets = Some(store);
    fx.post = Some("_posts/hello".to_string());

    assert_eq!(
      fx.with(|s| image(s, &image_node("cat.jpg", None))),
      r#"<img src="/2024/01/01/hello/cat.jpg">"#
    );
    assert_eq!(
      fx.with(|s| image(s, &image_node("dog.jpg", None))),
      r#"<img src="/dog.jpg">"#
    );
  }

  #[test]
  fn test_code_block_highlighted() {
    let mut fx = Fixture::new();
    let node = CodeNode {
      lang: Some("js".to_string()),
      code: "  if (a < b) {}\n".to_string(),
    };
    let html = fx.with(|s| code(s, &node));
    assert!(html.starts_with("<pre><code class=\"js\"><span class=\""));
    assert!(html.contains(">if</span>"));
    assert!(html.contains("&lt;"));
    assert!(!html.contains("  if"));
    assert!(html.ends_with("</code></pre>\n"));
  }

  #[test]
  fn test_code_block_plain_fallback() {
    let mut fx = Fixture::new();
    let node = CodeNode {
      lang: Some("no-such-lang".to_string()),
      code: "  if (a < b) {}\n".to_string(),
    };
    assert_eq!(
      fx.with(|s| code(s, &node)),
      "<pre><code class=\"no-such-lang\">if (a &lt; b) {}\n</code></pre>\n"
    );

    let node = CodeNode {
      lang: None,
      code: "<tag>\n".to_string(),
    };
    assert_eq!(
      fx.with(|s| code(s, &node)),
      "<pre><code>&lt;tag&gt;\n</code></pre>\n"
    );
  }

  #[test]
  fn test_paragraph_description_list() {
    let mut fx = Fixture::new();
    assert_eq!(
      fx.with(|s| paragraph(s, "Description Term<br>: This is the Description")),
      "<dl><dt>Description Term</dt><dd>This is the Description</dd></dl>"
    );
    assert_eq!(
      fx.with(|s| paragraph(s, "Description Term<br>:This is the Description")),
      "<p>Description Term<br>:This is the Description</p>\n"
    );
  }

  #[test]
  fn test_paragraph_description_list_disabled() {
    let mut fx = Fixture::new();
    fx.config.description_lists = false;
    assert_eq!(
      fx.with(|s| paragraph(s, "Term<br>: Desc")),
      "<p>Term<br>: Desc</p>\n"
    );
  }

  #[test]
  fn test_list_item_todo() {
    let mut fx = Fixture::new();
    assert_eq!(
      fx.with(|s| list_item(s, "[ ] buy milk")),
      "<li style=\"list-style: none\"><input type=\"checkbox\"></input> buy milk</li>\n"
    );
    assert_eq!(
      fx.with(|s| list_item(s, " [x] done [ ] not a box")),
      "<li style=\"list-style: none\"><input type=\"checkbox\" checked></input> done [ ] not a box</li>\n"
    );
    assert_eq!(
      fx.with(|s| list_item(s, "plain [x]")),
      "<li>plain [x]</li>\n"
    );
  }
}
