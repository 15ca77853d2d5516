//! Page acquisition for the brochure pipeline.
//!
//! - [`fetch`]: the [`PageFetcher`] trait and its HTTP implementation
//! - [`extract`]: HTML parsing into a [`Page`] (title, clean text, links)

pub mod extract;
pub mod fetch;

pub use extract::{extract, Page, NO_TITLE};
pub use fetch::{HttpPageFetcher, PageFetcher, DEFAULT_USER_AGENT};

/// Fetch `url` and extract it into a [`Page`].
pub async fn load_page(fetcher: &dyn PageFetcher, url: &str) -> brochure_common::Result<Page> {
    let raw = fetcher.fetch(url).await?;
    Ok(extract(url, &raw))
}
