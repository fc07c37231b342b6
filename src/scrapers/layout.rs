//! Column → extraction rule table for list pages.
//!
//! The site's markup changes now and then; keeping the selectors in one
//! serializable table lets an operator ship a fixed layout as JSON
//! (`--layout layout.json`) without rebuilding.

use std::path::Path;

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::models::ListingColumn;
use crate::{Result, ScoutError};

/// How one column is pulled out of a listing entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// First text node of the first element matching `selector`
    FirstText {
        selector: String,
        #[serde(default)]
        suffix: String,
    },
    /// Every non-blank text node under all matches, joined by `separator`
    JoinText { selector: String, separator: String },
    /// Attribute of the first match; `absolute` resolves it against the page URL
    Attr {
        selector: String,
        attr: String,
        #[serde(default)]
        suffix: String,
        #[serde(default)]
        absolute: bool,
    },
    /// Last house-info segment containing any of `keywords`
    Segment { keywords: Vec<String> },
    /// First capture group of `pattern` matched against the follow-info text
    FollowInfo { pattern: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub column: ListingColumn,
    #[serde(flatten)]
    pub rule: FieldRule,
}

/// Selectors describing a result page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingLayout {
    /// One match per listing, in document order
    pub entry: String,
    /// Element whose first text node is the `|`-separated house-info line
    pub house_info: String,
    pub house_info_separator: String,
    /// Element whose direct text nodes carry follow/visit/publish info
    pub follow_info: String,
    pub fields: Vec<FieldSpec>,
}

impl ListingLayout {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ScoutError::Configuration(format!("layout file {}: {}", path.display(), err))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            ScoutError::Configuration(format!("layout file {}: {}", path.display(), err))
        })
    }

    /// Parse every selector and pattern once
    pub fn compile(&self) -> Result<CompiledLayout> {
        let fields = self
            .fields
            .iter()
            .map(|spec| Ok((spec.column, compile_rule(&spec.rule)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledLayout {
            entry: selector(&self.entry)?,
            house_info: selector(&self.house_info)?,
            house_info_separator: self.house_info_separator.clone(),
            follow_info: selector(&self.follow_info)?,
            fields,
        })
    }
}

impl Default for ListingLayout {
    /// LianJia's `ershoufang` result list
    fn default() -> Self {
        use ListingColumn::*;

        let first_text = |column, selector: &str, suffix: &str| FieldSpec {
            column,
            rule: FieldRule::FirstText {
                selector: selector.to_string(),
                suffix: suffix.to_string(),
            },
        };
        let segment = |column, keywords: &[&str]| FieldSpec {
            column,
            rule: FieldRule::Segment {
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            },
        };
        let follow = |column, pattern: &str| FieldSpec {
            column,
            rule: FieldRule::FollowInfo {
                pattern: pattern.to_string(),
            },
        };

        Self {
            entry: "ul.sellListContent > li".to_string(),
            house_info: "div.info div.address > div".to_string(),
            house_info_separator: " | ".to_string(),
            follow_info: "div.info div.followInfo".to_string(),
            fields: vec![
                first_text(Title, "div.info div.title > a", ""),
                FieldSpec {
                    column: Location,
                    rule: FieldRule::JoinText {
                        selector: "div.info div.flood div.positionInfo > a".to_string(),
                        separator: ", ".to_string(),
                    },
                },
                segment(Configuration, &["室", "厅"]),
                segment(Area, &["平米"]),
                segment(Towards, &["东", "南", "西", "北"]),
                segment(Decorate, &["精装", "简装", "毛坯"]),
                segment(Storey, &["层"]),
                segment(Period, &["年"]),
                segment(Categorie, &["板塔结合", "板楼", "塔楼"]),
                first_text(TotalPrice, "div.info div.priceInfo > div > span", " 万"),
                FieldSpec {
                    column: UnitPrice,
                    rule: FieldRule::Attr {
                        selector: "div.info div.priceInfo div.unitPrice".to_string(),
                        attr: "data-price".to_string(),
                        suffix: " 元".to_string(),
                        absolute: false,
                    },
                },
                follow(FollowCount, r"(\d+)\s*人关注"),
                follow(VisitCount, r"共(\d+)\s*次带看"),
                follow(PublishTime, r"((?:\d+天(?:以前|以内)发布)|今天发布|刚刚发布)"),
                FieldSpec {
                    column: Tags,
                    rule: FieldRule::JoinText {
                        selector: "div.info div.tag".to_string(),
                        separator: " | ".to_string(),
                    },
                },
                FieldSpec {
                    column: Link,
                    rule: FieldRule::Attr {
                        selector: "div.info div.title > a".to_string(),
                        attr: "href".to_string(),
                        suffix: String::new(),
                        absolute: true,
                    },
                },
            ],
        }
    }
}

#[derive(Debug)]
pub(crate) enum CompiledRule {
    FirstText { selector: Selector, suffix: String },
    JoinText { selector: Selector, separator: String },
    Attr {
        selector: Selector,
        attr: String,
        suffix: String,
        absolute: bool,
    },
    Segment { keywords: Vec<String> },
    FollowInfo { pattern: Regex },
}

/// A `ListingLayout` with its selectors and patterns parsed
#[derive(Debug)]
pub struct CompiledLayout {
    pub(crate) entry: Selector,
    pub(crate) house_info: Selector,
    pub(crate) house_info_separator: String,
    pub(crate) follow_info: Selector,
    pub(crate) fields: Vec<(ListingColumn, CompiledRule)>,
}

fn compile_rule(rule: &FieldRule) -> Result<CompiledRule> {
    Ok(match rule {
        FieldRule::FirstText { selector: sel, suffix } => CompiledRule::FirstText {
            selector: selector(sel)?,
            suffix: suffix.clone(),
        },
        FieldRule::JoinText { selector: sel, separator } => CompiledRule::JoinText {
            selector: selector(sel)?,
            separator: separator.clone(),
        },
        FieldRule::Attr {
            selector: sel,
            attr,
            suffix,
            absolute,
        } => CompiledRule::Attr {
            selector: selector(sel)?,
            attr: attr.clone(),
            suffix: suffix.clone(),
            absolute: *absolute,
        },
        FieldRule::Segment { keywords } => CompiledRule::Segment {
            keywords: keywords.clone(),
        },
        FieldRule::FollowInfo { pattern } => CompiledRule::FollowInfo {
            pattern: Regex::new(pattern).map_err(|err| {
                ScoutError::Configuration(format!("invalid pattern `{pattern}`: {err}"))
            })?,
        },
    })
}

#[inline]
pub(crate) fn selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str)
        .map_err(|_| ScoutError::Configuration(format!("invalid selector `{sel_str}`")))
}
