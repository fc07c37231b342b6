pub mod detail;
pub mod listing;

pub use detail::{DetailRun, DetailSummary};
pub use listing::{ListingRun, RunSummary};

use std::time::Duration;

use rand::Rng;

/// Sleep for a random duration in `[min_ms, max_ms]`; a zero upper bound skips the pause.
pub(crate) async fn polite_pause(min_ms: u64, max_ms: u64) {
    if max_ms == 0 {
        return;
    }
    let min_ms = min_ms.min(max_ms);
    let millis = rand::rng().random_range(min_ms..=max_ms);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
