// src/sitemap/parse.rs
// =============================================================================
// Parses one sitemap document.
//
// A sitemap is one of two things:
//
//   <sitemapindex>                      <urlset>
//     <sitemap><loc>a.xml</loc></sitemap>  <url><loc>/page-1</loc></url>
//     <sitemap><loc>b.xml</loc></sitemap>  <url><loc>/page-2</loc></url>
//   </sitemapindex>                     </urlset>
//
// Anything else (RSS feeds served as sitemaps, hand-rolled XML) falls back to
// scanning every <loc> and guessing: locations ending in .xml / .xml.gz are
// treated as child sitemaps, everything else as pages.
//
// The reader is quick-xml's streaming reader; we only ever look at element
// names and the text inside <loc>.
// =============================================================================

use crate::error::SitemapError;
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

// One parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapNode {
    /// <sitemapindex>: every <loc> is another sitemap
    Index(Vec<String>),
    /// <urlset>: every <loc> is a page
    UrlSet(Vec<String>),
    /// Unknown root element, locations classified by their extension
    Unrecognized {
        sitemaps: Vec<String>,
        pages: Vec<String>,
    },
}

impl SitemapNode {
    pub fn child_sitemaps(&self) -> &[String] {
        match self {
            SitemapNode::Index(children) => children,
            SitemapNode::UrlSet(_) => &[],
            SitemapNode::Unrecognized { sitemaps, .. } => sitemaps,
        }
    }

    pub fn page_urls(&self) -> &[String] {
        match self {
            SitemapNode::Index(_) => &[],
            SitemapNode::UrlSet(pages) => pages,
            SitemapNode::Unrecognized { pages, .. } => pages,
        }
    }
}

// Turns a downloaded body into text, gunzipping it when needed
//
// Servers hand out .xml.gz files either raw (application/x-gzip) or already
// decoded, so we sniff the magic bytes instead of trusting the URL.
pub fn decode_body(url: &str, body: &[u8]) -> Result<String, SitemapError> {
    if body.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(body)
            .read_to_string(&mut text)
            .map_err(|e| SitemapError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(text)
    } else {
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}

// Parses a sitemap document
//
// Returns SitemapError::Malformed for anything that is not well-formed XML;
// the caller drops that branch and carries on.
pub fn parse_sitemap(url: &str, xml: &str) -> Result<SitemapNode, SitemapError> {
    let malformed = |reason: String| SitemapError::Malformed {
        url: url.to_string(),
        reason,
    };

    let xml = xml.trim_start_matches('\u{feff}').trim();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<String> = None;
    let mut stack: Vec<String> = Vec::new();
    let mut current_loc: Option<String> = None;
    let mut locations: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).to_lowercase();
                if root.is_none() {
                    root = Some(name.clone());
                }
                if name == "loc" && accepts_loc(root.as_deref(), stack.last()) {
                    current_loc = Some(String::new());
                }
                stack.push(name);
            }
            Ok(Event::Empty(element)) => {
                if root.is_none() {
                    let name =
                        String::from_utf8_lossy(element.local_name().as_ref()).to_lowercase();
                    root = Some(name);
                }
            }
            Ok(Event::End(element)) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).to_lowercase();
                stack.pop();
                if name == "loc" {
                    if let Some(loc) = current_loc.take() {
                        let loc = loc.trim();
                        if !loc.is_empty() {
                            locations.push(loc.to_string());
                        }
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(loc) = current_loc.as_mut() {
                    let text = text.unescape().map_err(|e| malformed(e.to_string()))?;
                    loc.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(loc) = current_loc.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(malformed(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if !stack.is_empty() {
        return Err(malformed(format!("unclosed element <{}>", stack.join("><"))));
    }

    let Some(root) = root else {
        return Err(malformed("document has no root element".to_string()));
    };

    let node = match root.as_str() {
        "sitemapindex" => SitemapNode::Index(locations),
        "urlset" => SitemapNode::UrlSet(locations),
        _ => {
            let (sitemaps, pages): (Vec<String>, Vec<String>) =
                locations.into_iter().partition(|loc| looks_like_sitemap(loc));
            SitemapNode::Unrecognized { sitemaps, pages }
        }
    };

    Ok(node)
}

// Inside known documents only <url><loc> / <sitemap><loc> count, which keeps
// image:loc and video:loc extensions out of the page list.
fn accepts_loc(root: Option<&str>, parent: Option<&String>) -> bool {
    match root {
        Some("sitemapindex") | Some("urlset") => {
            matches!(parent.map(String::as_str), Some("url") | Some("sitemap"))
        }
        _ => true,
    }
}

fn looks_like_sitemap(loc: &str) -> bool {
    let path = loc
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    path.ends_with(".xml") || path.ends_with(".xml.gz")
}
