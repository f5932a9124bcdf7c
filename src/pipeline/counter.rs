//! Page counting for paginated resources
//!
//! The probe asks for one record without optional fields; its `last` link
//! tells whether the resource has anything at all. Because the probe's page
//! size is 1, its page index counts records rather than pages, so a second
//! request with the server's default page size supplies the real count.

use crate::dataset::ResourceDescriptor;
use crate::link::last_page_index;
use crate::pipeline::client::{ApiClient, ApiPage};
use crate::{HarvestError, Result};

/// Counts the pages of a resource
///
/// # Returns
///
/// * `Ok(n)` - Pages `0..n` exist; `0` when the resource is empty
/// * `Err(HarvestError::CountUnavailable)` - A request failed or the
///   `last` link carried no page number
pub async fn count_pages(
    client: &ApiClient,
    dataset: &str,
    resource: &ResourceDescriptor,
) -> Result<u64> {
    let unavailable = |reason: String| HarvestError::CountUnavailable {
        dataset: dataset.to_string(),
        reason,
    };

    let probe = client
        .get_page(&resource.endpoint, &resource.probe_query())
        .await
        .map_err(|e| unavailable(format!("probe failed: {}", e)))?;

    let Some(probe_last) = last_index(&probe).map_err(&unavailable)? else {
        tracing::info!("{}: no last-page link, nothing to fetch", dataset);
        return Ok(0);
    };

    if probe_last == 0 && probe.list.is_empty() {
        tracing::info!("{}: resource is empty", dataset);
        return Ok(0);
    }

    let full = client
        .get_page(&resource.endpoint, &resource.count_query())
        .await
        .map_err(|e| unavailable(format!("count request failed: {}", e)))?;

    let last = last_index(&full)
        .map_err(&unavailable)?
        .ok_or_else(|| unavailable("count response has no last-page link".to_string()))?;

    let pages = last + 1;
    tracing::info!("{}: {} pages (probe reported {})", dataset, pages, probe_last);
    Ok(pages)
}

/// Page index of the `last` link: `None` when absent, an error when unparseable
fn last_index(page: &ApiPage) -> std::result::Result<Option<u64>, String> {
    match &page.last {
        None => Ok(None),
        Some(link) => last_page_index(link)
            .map(Some)
            .ok_or_else(|| format!("no page number in last link '{}'", link)),
    }
}
