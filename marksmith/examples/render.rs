use std::{env, fs, sync::Arc};

use marksmith::{
  AssetRecord,
  Document,
  ExternalLinkOptions,
  MarkedOptions,
  MarkedRenderer,
  MemoryAssetStore,
  PostRecord,
  SiteContext,
};

const SAMPLE: &str = r#"# Getting started

Marksmith turns "plain" Markdown into HTML -- with anchors, smart quotes...

## Links

Visit https://hexo.io or [the docs](/docs/ "Documentation").

## Getting started

- [ ] write a post
- [x] render it

Term
: A description list entry

![A cat](cat.png)
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
    .init();

  // Render a file if one was given, the built-in sample otherwise
  let (text, path) = match env::args().nth(1) {
    Some(path) => (fs::read_to_string(&path)?, path),
    None => (SAMPLE.to_string(), "source/_posts/sample.md".to_string()),
  };

  let site = SiteContext {
    url: "https://blog.example.com".to_string(),
    root: "/blog/".to_string(),
    post_asset_folder: true,
    ..Default::default()
  };

  let mut store = MemoryAssetStore::new();
  store
    .insert_post("_posts/sample.md", PostRecord {
      slug:       "sample".to_string(),
      path:       "2024/05/01/sample/".to_string(),
      source_dir: "_posts/sample".to_string(),
    })
    .insert_asset("_posts/sample/cat.png", AssetRecord {
      path: "2024/05/01/sample/cat.png".to_string(),
    });

  let options = MarkedOptions {
    prepend_root: Some(true),
    post_asset: Some(true),
    lazyload: Some(true),
    figcaption: Some(true),
    external_link: Some(ExternalLinkOptions {
      enable:   true,
      exclude:  Vec::new(),
      nofollow: true,
    }),
    ..Default::default()
  };

  let renderer = MarkedRenderer::new(site)
    .with_options(options)
    .with_asset_store(Arc::new(store));

  let html = renderer.render(&Document::new(text).with_path(path), None);

  println!("{html}");
  Ok(())
}
