use crate::Result;
use async_trait::async_trait;

/// Fetches raw page HTML.
/// The listing and detail runs only talk to this trait, so tests can swap in canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return its body; `referer` is sent as the `Referer` header when given
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<String>;

    /// Best-effort request made before the first fetch against a new origin
    async fn warm_up(&self, _url: &str) {}
}
