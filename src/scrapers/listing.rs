use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use crate::models::ListingRecord;
use crate::scrapers::layout::{CompiledLayout, CompiledRule};

/// Extract every listing on a result page, in document order.
///
/// Fields the layout cannot find are left empty; a page without any entry
/// yields an empty vector and the caller decides what that means.
pub fn parse_list_page(html: &str, layout: &CompiledLayout, page_url: &Url) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);

    let records: Vec<ListingRecord> = document
        .select(&layout.entry)
        .map(|entry| extract_entry(entry, layout, page_url))
        .collect();

    debug!("Found {} listing entries on {}", records.len(), page_url);
    records
}

fn extract_entry(entry: ElementRef<'_>, layout: &CompiledLayout, page_url: &Url) -> ListingRecord {
    let house_info: Vec<String> = entry
        .select(&layout.house_info)
        .next()
        .and_then(|el| el.text().map(str::trim).find(|t| !t.is_empty()))
        .map(|line| {
            line.split(layout.house_info_separator.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let follow_info = entry
        .select(&layout.follow_info)
        .next()
        .map(|el| {
            el.children()
                .filter_map(|node| node.value().as_text())
                .map(|text| text.trim())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" / ")
        })
        .unwrap_or_default();

    let mut record = ListingRecord::default();
    for (column, rule) in &layout.fields {
        *record.field_mut(*column) = apply_rule(rule, entry, &house_info, &follow_info, page_url);
    }
    record
}

fn apply_rule(
    rule: &CompiledRule,
    entry: ElementRef<'_>,
    house_info: &[String],
    follow_info: &str,
    page_url: &Url,
) -> String {
    match rule {
        CompiledRule::FirstText { selector, suffix } => {
            let text = entry
                .select(selector)
                .next()
                .and_then(|el| el.text().map(str::trim).find(|t| !t.is_empty()))
                .unwrap_or_default();
            with_suffix(text, suffix)
        }
        CompiledRule::JoinText { selector, separator } => entry
            .select(selector)
            .flat_map(|el| el.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(separator.as_str()),
        CompiledRule::Attr {
            selector,
            attr,
            suffix,
            absolute,
        } => {
            let value = entry
                .select(selector)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(str::trim)
                .unwrap_or_default();
            if *absolute && !value.is_empty() {
                absolutize(page_url, value)
            } else {
                with_suffix(value, suffix)
            }
        }
        // Later segments win, matching the order the site lists them in
        CompiledRule::Segment { keywords } => house_info
            .iter()
            .rev()
            .find(|segment| keywords.iter().any(|k| segment.contains(k.as_str())))
            .cloned()
            .unwrap_or_default(),
        CompiledRule::FollowInfo { pattern } => pattern
            .captures(follow_info)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    }
}

fn with_suffix(value: &str, suffix: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("{value}{suffix}")
    }
}

fn absolutize(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
