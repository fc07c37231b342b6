use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};
use url::Url;

use crate::models::{DetailRecord, DetailRow, DetailStatus, ListingRecord};
use crate::output::{detail_output_paths, read_listings, write_detail_csv, write_json};
use crate::pipeline::polite_pause;
use crate::scrapers::{parse_detail_page, DetailLayout, DetailParse, PageFetcher};
use crate::{Result, ScoutError};

#[derive(Debug, Clone)]
pub struct DetailSummary {
    pub total: usize,
    pub ok: usize,
    pub login_required: usize,
    pub no_link: usize,
    pub failed: usize,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub elapsed: chrono::Duration,
}

/// Follows each listing's link and joins its detail page onto the listing row
pub struct DetailRun<F: PageFetcher> {
    fetcher: F,
    layout: DetailLayout,
    limit: Option<usize>,
    /// Pause between detail pages, in milliseconds
    delay_ms: (u64, u64),
}

impl<F: PageFetcher> DetailRun<F> {
    pub fn new(fetcher: F) -> Result<Self> {
        Ok(Self {
            fetcher,
            layout: DetailLayout::new()?,
            limit: None,
            delay_ms: (0, 0),
        })
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Delay bounds in seconds; negatives clamp to zero and `max` to at least `min`
    pub fn with_delay_secs(mut self, min: f64, max: f64) -> Self {
        let min = min.max(0.0);
        let max = max.max(min);
        self.delay_ms = ((min * 1000.0) as u64, (max * 1000.0) as u64);
        self
    }

    /// Read listings from `input`, scrape their detail pages, and write the
    /// joined rows as CSV and JSON
    pub async fn run(&self, input: &Path, output: Option<&Path>) -> Result<DetailSummary> {
        let start_time = Local::now();
        let mut listings = read_listings(input)?;
        if let Some(limit) = self.limit {
            listings.truncate(limit);
        }
        info!("Loaded {} listings from {}", listings.len(), input.display());

        let rows = self.scrape(listings).await;

        let (csv_path, json_path) = detail_output_paths(input, output);
        write_detail_csv(&csv_path, &rows)?;
        write_json(&json_path, &rows)?;
        info!("💾 Detail table saved to {}", csv_path.display());

        let mut summary = DetailSummary {
            total: rows.len(),
            ok: 0,
            login_required: 0,
            no_link: 0,
            failed: 0,
            csv_path,
            json_path,
            elapsed: Local::now() - start_time,
        };
        for row in &rows {
            match row.status {
                DetailStatus::Ok => summary.ok += 1,
                DetailStatus::LoginRequired => summary.login_required += 1,
                DetailStatus::NoLink => summary.no_link += 1,
                DetailStatus::Failed(_) => summary.failed += 1,
            }
        }
        Ok(summary)
    }

    /// Scrape every listing in order; a failed listing is recorded in its
    /// status column and the run moves on.
    pub async fn scrape(&self, listings: Vec<ListingRecord>) -> Vec<DetailRow> {
        let total = listings.len();
        let mut warmed: HashSet<String> = HashSet::new();
        let mut rows = Vec::with_capacity(total);

        for (index, listing) in listings.into_iter().enumerate() {
            let position = index + 1;
            if listing.link.trim().is_empty() {
                info!("[{}/{}] Skipping entry without detail link", position, total);
                rows.push(DetailRow {
                    listing,
                    detail: DetailRecord::default(),
                    status: DetailStatus::NoLink,
                });
                continue;
            }

            let (detail, status) = match self.scrape_one(&listing.link, &mut warmed).await {
                Ok(parsed) if parsed.login_required => (parsed.record, DetailStatus::LoginRequired),
                Ok(parsed) => (parsed.record, DetailStatus::Ok),
                Err(err) => {
                    warn!("[{}/{}] {} failed: {}", position, total, listing.link, err);
                    (DetailRecord::default(), DetailStatus::failed(err))
                }
            };
            info!("[{}/{}] {} -> {}", position, total, listing.link, status.as_str());
            rows.push(DetailRow {
                listing,
                detail,
                status,
            });

            if position != total {
                polite_pause(self.delay_ms.0, self.delay_ms.1).await;
            }
        }
        rows
    }

    async fn scrape_one(
        &self,
        link: &str,
        warmed: &mut HashSet<String>,
    ) -> Result<DetailParse> {
        let url = Url::parse(link.trim())
            .map_err(|err| ScoutError::Parse(format!("invalid detail link `{link}`: {err}")))?;
        let referer = format!("{}/ershoufang/", url.origin().ascii_serialization());

        if warmed.insert(referer.clone()) {
            self.fetcher.warm_up(&referer).await;
        }

        let html = self.fetcher.fetch(url.as_str(), Some(&referer)).await?;
        Ok(parse_detail_page(&html, &self.layout))
    }
}
