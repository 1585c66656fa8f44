//! Canonical site identity derived from a URL
//!
//! Two URLs address the same deployment when their slugs are equal. The slug
//! drops the scheme and any leading `www.`, keeps an explicit port, and trims
//! trailing slashes from the path, so `https://example.com/site` and
//! `http://www.example.com/site/` agree.

use url::Url;

/// Slug of an already parsed URL. Returns `None` when the URL has no host.
pub fn slug_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    let mut slug = String::from(host);
    if let Some(port) = url.port() {
        slug.push(':');
        slug.push_str(&port.to_string());
    }
    slug.push_str(url.path().trim_end_matches('/'));
    Some(slug)
}

/// Slug of a URL string. Returns `None` when the text does not parse as a
/// URL with a host.
pub fn url_slug(url: &str) -> Option<String> {
    slug_of(&Url::parse(url).ok()?)
}
