// src/links/canonical.rs
// =============================================================================
// URL canonicalization against a site's base URL.
//
// Every URL the crawler touches (seed, sitemap entries, outbound links, the
// URL a page finally lands on after redirects) goes through here so that the
// visited/discovered sets compare like with like.
//
// Canonical form:
// - scheme and host are taken from the site base (www-insensitive match)
// - default ports removed, fragment dropped
// - empty path becomes "/"
// - a trailing slash is added unless the last segment looks like a file
//   ("/about" -> "/about/", "/brochure.pdf" stays as is)
// - the query string is kept verbatim
//
// A URL on another host is not an error, it is simply "not ours": the
// canonicalizer returns None and the caller drops it.
// =============================================================================

use crate::error::UrlError;
use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

// A URL in canonical form for one site
//
// Only SiteBase can build one, so holding a CanonicalUrl means the URL
// belongs to the site it was canonicalized against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for CanonicalUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

// The canonical root of the site being crawled: scheme://host[:port]/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteBase {
    root: Url,
    host_key: String,
}

impl SiteBase {
    // Builds the site base from a user-supplied seed
    //
    // A seed without a scheme is assumed to be https:
    //   "example.com"          -> "https://example.com/"
    //   "http://Example.com/a" -> "http://example.com/"
    pub fn from_seed(seed: &str) -> Result<Self, UrlError> {
        let seed = seed.trim();
        let invalid = |reason: &str| UrlError::InvalidUrl {
            url: seed.to_string(),
            reason: reason.to_string(),
        };

        if seed.is_empty() {
            return Err(invalid("empty URL"));
        }

        let with_scheme = if seed.contains("://") {
            seed.to_string()
        } else {
            format!("https://{}", seed)
        };

        let mut root = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(root.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }

        let host_key = match root.host_str() {
            Some(host) if !host.is_empty() => host_key(host),
            _ => return Err(invalid("URL has no host")),
        };

        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        // Url::set_username/set_password only fail on cannot-be-a-base URLs,
        // which http(s) URLs with a host never are.
        let _ = root.set_username("");
        let _ = root.set_password(None);

        Ok(Self { root, host_key })
    }

    pub fn as_str(&self) -> &str {
        self.root.as_str()
    }

    pub fn root(&self) -> CanonicalUrl {
        CanonicalUrl(self.root.clone())
    }

    // Canonicalizes a raw (absolute or relative) URL
    //
    // Returns None for anything that is not an http(s) URL on this site.
    // Never panics, whatever the input.
    pub fn canonicalize(&self, raw: &str) -> Option<CanonicalUrl> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut url = self.root.join(raw).ok()?;

        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        match url.host_str() {
            Some(host) if !host.is_empty() && host_key(host) == self.host_key => {}
            _ => return None,
        }

        // Url::port() is already None when the port is the scheme default
        let explicit_port = url.port();

        url.set_scheme(self.root.scheme()).ok()?;
        url.set_host(self.root.host_str()).ok()?;
        url.set_port(explicit_port.or(self.root.port())).ok()?;
        url.set_username("").ok()?;
        url.set_password(None).ok()?;
        url.set_fragment(None);

        let path = normalize_path(url.path());
        url.set_path(&path);

        Some(CanonicalUrl(url))
    }
}

fn host_key(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path.ends_with('/') {
        return path.to_string();
    }

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    if last_segment.contains('.') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
