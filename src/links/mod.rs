// src/links/mod.rs
// =============================================================================
// Everything about URLs: what counts as "the same page", which pages are off
// limits, and which links a page points to.
//
// Submodules:
// - canonical: the URL canonicalizer (SiteBase + CanonicalUrl)
// - filter: exclusion patterns and product/category classification
// - html: same-site link extraction from rendered HTML
// =============================================================================

mod canonical;
mod filter;
mod html;

pub use canonical::{CanonicalUrl, SiteBase};
pub use filter::{UrlFilter, UrlKind};
pub use html::extract_site_links;
