use std::fmt;
use std::ops::RangeInclusive;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Result, ScoutError};

/// Highest result page the site serves
pub const MAX_PAGE: u32 = 100;

/// Inclusive range of result pages to scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    /// First page (1-based)
    pub start: u32,
    /// Last page, inclusive
    pub end: u32,
}

impl PageRange {
    /// Validate `1 <= start <= end <= 100`
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start < 1 || start > end || end > MAX_PAGE {
            return Err(ScoutError::InvalidRange(format!("{start}-{end}")));
        }
        Ok(Self { start, end })
    }

    /// Parse operator input such as `1-5`, `3 到 8` or `pages 2, 4`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || ScoutError::InvalidRange(input.trim().to_string());
        let re = Regex::new(r"^\D*(\d+)\D+(\d+)\D*$").map_err(|_| invalid())?;
        let caps = re.captures(input.trim()).ok_or_else(invalid)?;
        let start = caps[1].parse::<u32>().map_err(|_| invalid())?;
        let end = caps[2].parse::<u32>().map_err(|_| invalid())?;
        Self::new(start, end).map_err(|_| invalid())
    }

    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn page_count(&self) -> usize {
        (self.end - self.start + 1) as usize
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// What the listing run does when a page cannot be fetched or parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the page and its error, then continue with the next page
    #[default]
    Skip,
    /// Stop the run; rows already appended to the CSV stay on disk
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds() {
        assert_eq!(PageRange::parse("100-100").unwrap(), PageRange { start: 100, end: 100 });
        assert_eq!(PageRange::parse("1-100").unwrap().page_count(), 100);
    }

    #[test]
    fn accepts_loose_separators() {
        assert_eq!(PageRange::parse(" 3 到 8 ").unwrap(), PageRange { start: 3, end: 8 });
        assert_eq!(PageRange::parse("p2,p4").unwrap(), PageRange { start: 2, end: 4 });
    }

    #[test]
    fn rejects_out_of_bounds() {
        for input in ["0-5", "50-10", "1-101", "5", "", "a-b"] {
            assert!(
                matches!(PageRange::parse(input), Err(ScoutError::InvalidRange(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn pages_ascend() {
        let range = PageRange::new(4, 6).unwrap();
        assert_eq!(range.pages().collect::<Vec<_>>(), vec![4, 5, 6]);
        assert_eq!(range.to_string(), "4-6");
    }
}
