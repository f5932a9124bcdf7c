//! Endpoint URL construction and pagination-link parsing
//!
//! The API reports pagination as absolute URLs (`"last":
//! "https://www.drupal.org/api-d7/node.json?type=event&page=41"`). The page
//! number is a zero-based index.

use crate::HarvestError;
use url::Url;

/// Joins an endpoint path onto the API base URL
///
/// The base is treated as a directory whether or not it ends with `/`, so
/// `https://host/api-d7` + `node.json` gives `https://host/api-d7/node.json`.
pub fn endpoint_url(base: &str, endpoint: &str) -> Result<Url, HarvestError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(endpoint.trim_start_matches('/'))?)
}

/// Extracts the zero-based page index from a pagination link
///
/// Accepts absolute URLs and bare query strings. Returns `None` when the link
/// carries no parseable `page` parameter.
///
/// # Example
///
/// ```
/// use dorg_harvest::link::last_page_index;
///
/// assert_eq!(last_page_index("https://x.org/api-d7/node.json?type=event&page=2"), Some(2));
/// assert_eq!(last_page_index("https://x.org/api-d7/node.json"), None);
/// ```
pub fn last_page_index(link: &str) -> Option<u64> {
    let query = match Url::parse(link) {
        Ok(url) => url.query().map(str::to_string),
        Err(_) => link.split_once('?').map(|(_, q)| q.to_string()),
    }?;

    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "page")
        .last()
        .and_then(|(_, value)| value.trim().parse().ok())
}
