use std::path::PathBuf;

use chrono::Local;
use tracing::{error, info, warn};
use url::Url;

use crate::cities::{city_code, list_page_url};
use crate::models::{ListingRecord, LISTING_HEADER};
use crate::output::{write_json, CsvAppender};
use crate::pipeline::polite_pause;
use crate::scrapers::{parse_list_page, CompiledLayout, FailurePolicy, PageFetcher, PageRange};
use crate::{Result, ScoutError};

/// What a listing run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub city: String,
    pub range: PageRange,
    pub pages_succeeded: Vec<u32>,
    /// Page number and the error that made it skip
    pub failed_pages: Vec<(u32, String)>,
    pub listings: usize,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub elapsed: chrono::Duration,
}

/// Walks a city's result pages in ascending order, appending each page's
/// listings to `<city>_<l>-<r>.csv` and writing the whole run to
/// `<city>_<l>-<r>.json` at the end.
pub struct ListingRun<F: PageFetcher> {
    fetcher: F,
    layout: CompiledLayout,
    output_dir: PathBuf,
    policy: FailurePolicy,
    page_delay_ms: (u64, u64),
}

impl<F: PageFetcher> ListingRun<F> {
    pub fn new(fetcher: F, layout: CompiledLayout, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            layout,
            output_dir: output_dir.into(),
            policy: FailurePolicy::default(),
            page_delay_ms: (0, 0),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pause between pages, in milliseconds
    pub fn with_page_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.page_delay_ms = (min_ms, max_ms);
        self
    }

    pub async fn run(&self, city: &str, range: PageRange) -> Result<RunSummary> {
        let city = city.trim();
        let code = city_code(city).ok_or_else(|| ScoutError::UnknownCity(city.to_string()))?;
        let start_time = Local::now();

        let stem = format!("{city}_{range}");
        let csv_path = self.output_dir.join(format!("{stem}.csv"));
        let json_path = self.output_dir.join(format!("{stem}.json"));

        let mut csv = CsvAppender::open(&csv_path, &LISTING_HEADER)?;
        let mut records: Vec<ListingRecord> = Vec::new();
        let mut pages_succeeded = Vec::new();
        let mut failed_pages = Vec::new();

        info!("Scraping {} ({}) pages {} into {}", city, code, range, csv.path().display());

        for (done, page) in range.pages().enumerate() {
            let url = list_page_url(code, page);

            match self.scrape_page(&url, page).await {
                Ok(page_records) => {
                    for record in &page_records {
                        csv.append(&record.to_row())?;
                    }
                    csv.flush()?;
                    info!(
                        "[{}/{}] page {} -> {} listings (total {})",
                        done + 1,
                        range.page_count(),
                        page,
                        page_records.len(),
                        records.len() + page_records.len()
                    );
                    records.extend(page_records);
                    pages_succeeded.push(page);
                }
                Err(err) => match self.policy {
                    FailurePolicy::Skip => {
                        warn!("Page {} skipped: {}", page, err);
                        failed_pages.push((page, err.to_string()));
                    }
                    FailurePolicy::Abort => {
                        csv.flush()?;
                        error!("Page {} failed, aborting run: {}", page, err);
                        return Err(ScoutError::Page {
                            page,
                            source: Box::new(err),
                        });
                    }
                },
            }

            if page != range.end {
                polite_pause(self.page_delay_ms.0, self.page_delay_ms.1).await;
            }
        }

        write_json(&json_path, &records)?;
        info!("💾 Saved {} listings to {}", records.len(), json_path.display());

        Ok(RunSummary {
            city: city.to_string(),
            range,
            pages_succeeded,
            failed_pages,
            listings: records.len(),
            csv_path,
            json_path,
            elapsed: Local::now() - start_time,
        })
    }

    async fn scrape_page(&self, url: &str, page: u32) -> Result<Vec<ListingRecord>> {
        let html = self.fetcher.fetch(url, Some(url)).await?;
        let page_url = Url::parse(url).map_err(|err| ScoutError::Parse(format!("{url}: {err}")))?;

        let records = parse_list_page(&html, &self.layout, &page_url);
        if records.is_empty() {
            return Err(ScoutError::Parse(format!(
                "no listings on page {page}; check the session cookie"
            )));
        }
        Ok(records)
    }
}
