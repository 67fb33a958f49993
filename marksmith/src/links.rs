//! Link classification and URL encoding.
use std::{fmt::Write, sync::LazyLock};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;
use url::Url;

use crate::{options::ExternalLinkOptions, utils::never_matching_regex};

/// Characters `encodeURI` leaves alone besides ASCII alphanumerics.
const ENCODE_URI: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b';')
  .remove(b',')
  .remove(b'/')
  .remove(b'?')
  .remove(b':')
  .remove(b'@')
  .remove(b'&')
  .remove(b'=')
  .remove(b'+')
  .remove(b'$')
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'!')
  .remove(b'~')
  .remove(b'*')
  .remove(b'\'')
  .remove(b'(')
  .remove(b')')
  .remove(b'#');

static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap_or_else(|e| {
    log::error!("Failed to compile SCHEME_RE regex: {e}");
    never_matching_regex()
  })
});

/// Link targets blanked out when `sanitizeUrl` is on. Matched case-sensitively
/// against the raw href.
const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

/// Whether `href` starts with a scheme `sanitizeUrl` rejects.
#[must_use]
pub fn is_unsafe_url(href: &str) -> bool {
  UNSAFE_SCHEMES.iter().any(|scheme| href.starts_with(scheme))
}

/// Whether `url` starts with a `scheme:` prefix.
#[must_use]
pub fn has_scheme(url: &str) -> bool {
  SCHEME_RE.is_match(url)
}

/// Hostname of the configured site URL.
///
/// A value without a scheme (`example.com`) is used as the hostname as-is.
#[must_use]
pub fn site_host(site_url: &str) -> Option<String> {
  let site_url = site_url.trim();
  if site_url.is_empty() {
    return None;
  }

  match Url::parse(site_url) {
    Ok(parsed) => parsed.host_str().map(str::to_string),
    Err(_) if !site_url.contains("://") => Some(site_url.to_string()),
    Err(e) => {
      log::debug!("Site URL '{site_url}' has no usable host: {e}");
      None
    },
  }
}

/// Decide whether `url` leaves the site at `site_url`.
///
/// The link is resolved against the site host, so relative and
/// protocol-relative forms work. Only `http` and `https` targets can be
/// external, hosts are compared exactly, and any host listed in `exclude`
/// counts as internal. An unusable site URL makes every link internal.
#[must_use]
pub fn is_external_link(url: &str, site_url: &str, exclude: &[String]) -> bool {
  let Some(host) = site_host(site_url) else {
    return false;
  };

  let Ok(base) = Url::parse(&format!("http://{host}/")) else {
    log::debug!("Cannot build a base URL from site host '{host}'");
    return false;
  };

  let Ok(resolved) = base.join(url) else {
    return false;
  };

  if !matches!(resolved.scheme(), "http" | "https") {
    return false;
  }

  let Some(target) = resolved.host_str() else {
    return false;
  };

  if exclude.iter().any(|excluded| excluded == target) {
    return false;
  }

  target != host
}

/// The `target`/`rel` attributes for an external link.
///
/// `nofollow` replaces the plain `noopener` rel value instead of extending
/// it.
#[must_use]
pub const fn external_link_attrs(options: &ExternalLinkOptions) -> &'static str {
  match (options.enable, options.nofollow) {
    (true, true) => {
      " target=\"_blank\" rel=\"noopener external nofollow noreferrer\""
    },
    (true, false) => " target=\"_blank\" rel=\"noopener\"",
    (false, true) => " rel=\"noopener external nofollow noreferrer\"",
    (false, false) => "",
  }
}

/// Percent-encode a URL for an HTML attribute, like `encodeURI` after
/// decoding existing escapes.
///
/// Internationalized hostnames are converted to punycode. Opaque URLs such as
/// `mailto:` or `data:` are returned unchanged. If the decoded input is not
/// valid UTF-8 the raw value is returned.
#[must_use]
pub fn encode_url(raw: &str) -> String {
  if has_scheme(raw) {
    let Some((scheme, rest)) = raw.split_once("://") else {
      return raw.to_string();
    };
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    let authority = if authority.is_ascii() {
      authority.to_string()
    } else {
      ascii_authority(raw).unwrap_or_else(|| authority.to_string())
    };

    return format!("{scheme}://{authority}{}", encode_uri(tail));
  }

  encode_uri(raw)
}

/// Punycode form of the authority of `url` (`host[:port]`).
fn ascii_authority(url: &str) -> Option<String> {
  let parsed = Url::parse(url)
    .map_err(|e| log::debug!("Cannot parse '{url}' for host encoding: {e}"))
    .ok()?;
  let host = parsed.host_str()?;
  Some(match parsed.port() {
    Some(port) => format!("{host}:{port}"),
    None => host.to_string(),
  })
}

fn encode_uri(value: &str) -> String {
  match percent_decode_str(value).decode_utf8() {
    Ok(decoded) => utf8_percent_encode(&decoded, ENCODE_URI).to_string(),
    Err(e) => {
      log::debug!("Keeping raw URL '{value}': {e}");
      value.to_string()
    },
  }
}

/// Encode every character of `text` as a decimal character reference.
#[must_use]
pub fn mangle(text: &str) -> String {
  let mut out = String::with_capacity(text.len() * 6);
  for ch in text.chars() {
    let _ = write!(out, "&#{};", u32::from(ch));
  }
  out
}
