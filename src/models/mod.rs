use serde::{Deserialize, Serialize};

/// CSV header of a listing row, in column order
pub const LISTING_HEADER: [&str; 16] = [
    "标题",
    "地址",
    "户型",
    "面积",
    "朝向",
    "装修情况",
    "层数",
    "建造时间",
    "楼型",
    "总价",
    "每平米单价",
    "关注人数",
    "带看次数",
    "发布时间",
    "标签",
    "详情链接",
];

/// CSV header of the detail columns, in column order
pub const DETAIL_HEADER: [&str; 16] = [
    "房源标签",
    "核心卖点",
    "小区介绍",
    "周边配套",
    "交通出行",
    "税费解析",
    "权属抵押",
    "上次交易",
    "挂牌时间",
    "交易权属",
    "房屋用途",
    "房屋年限",
    "产权所属",
    "抵押信息",
    "交易属性",
    "户型分间",
];

pub const STATUS_HEADER: &str = "解析状态";

/// Columns of a listing row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListingColumn {
    Title,
    Location,
    Configuration,
    Area,
    Towards,
    Decorate,
    Storey,
    Period,
    Categorie,
    TotalPrice,
    UnitPrice,
    FollowCount,
    VisitCount,
    PublishTime,
    Tags,
    Link,
}

impl ListingColumn {
    pub const ALL: [ListingColumn; 16] = [
        ListingColumn::Title,
        ListingColumn::Location,
        ListingColumn::Configuration,
        ListingColumn::Area,
        ListingColumn::Towards,
        ListingColumn::Decorate,
        ListingColumn::Storey,
        ListingColumn::Period,
        ListingColumn::Categorie,
        ListingColumn::TotalPrice,
        ListingColumn::UnitPrice,
        ListingColumn::FollowCount,
        ListingColumn::VisitCount,
        ListingColumn::PublishTime,
        ListingColumn::Tags,
        ListingColumn::Link,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Native-language header of the column
    pub fn header(self) -> &'static str {
        LISTING_HEADER[self.index()]
    }
}

/// One for-sale listing as shown on a search result page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListingRecord {
    pub title: String,
    pub location: String,
    pub configuration: String,
    pub area: String,
    pub towards: String,
    pub decorate: String,
    pub storey: String,
    pub period: String,
    pub categorie: String,
    pub total_price: String,
    pub unit_price: String,
    pub follow_count: String,
    pub visit_count: String,
    pub publish_time: String,
    pub tags: String,
    pub link: String,
}

impl ListingRecord {
    pub fn field_mut(&mut self, column: ListingColumn) -> &mut String {
        match column {
            ListingColumn::Title => &mut self.title,
            ListingColumn::Location => &mut self.location,
            ListingColumn::Configuration => &mut self.configuration,
            ListingColumn::Area => &mut self.area,
            ListingColumn::Towards => &mut self.towards,
            ListingColumn::Decorate => &mut self.decorate,
            ListingColumn::Storey => &mut self.storey,
            ListingColumn::Period => &mut self.period,
            ListingColumn::Categorie => &mut self.categorie,
            ListingColumn::TotalPrice => &mut self.total_price,
            ListingColumn::UnitPrice => &mut self.unit_price,
            ListingColumn::FollowCount => &mut self.follow_count,
            ListingColumn::VisitCount => &mut self.visit_count,
            ListingColumn::PublishTime => &mut self.publish_time,
            ListingColumn::Tags => &mut self.tags,
            ListingColumn::Link => &mut self.link,
        }
    }

    /// Values in `LISTING_HEADER` order
    pub fn to_row(&self) -> [&str; 16] {
        [
            &self.title,
            &self.location,
            &self.configuration,
            &self.area,
            &self.towards,
            &self.decorate,
            &self.storey,
            &self.period,
            &self.categorie,
            &self.total_price,
            &self.unit_price,
            &self.follow_count,
            &self.visit_count,
            &self.publish_time,
            &self.tags,
            &self.link,
        ]
    }

    /// Rebuild a record from a CSV row, looking columns up by header name.
    /// Columns absent from `header` are left empty.
    pub fn from_row(header: &[String], row: &[String]) -> Self {
        let mut record = ListingRecord::default();
        for column in ListingColumn::ALL {
            if let Some(pos) = header.iter().position(|h| h.trim() == column.header()) {
                if let Some(value) = row.get(pos) {
                    *record.field_mut(column) = value.clone();
                }
            }
        }
        record
    }
}

/// Long-form fields of a listing's detail page, keyed by the listing link
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DetailRecord {
    pub tags: String,
    pub selling_points: String,
    pub community_intro: String,
    pub surroundings: String,
    pub transport: String,
    pub tax_analysis: String,
    pub ownership_mortgage: String,
    pub last_transaction: String,
    pub listed_at: String,
    pub transaction_rights: String,
    pub usage: String,
    pub property_term: String,
    pub ownership_type: String,
    pub mortgage_info: String,
    pub transaction_attributes: String,
    pub room_breakdown: String,
}

impl DetailRecord {
    /// Field addressed by its native-language label, if it is one of the 16 columns.
    pub fn field_by_label(&mut self, label: &str) -> Option<&mut String> {
        let field = match label {
            "房源标签" => &mut self.tags,
            "核心卖点" => &mut self.selling_points,
            "小区介绍" => &mut self.community_intro,
            "周边配套" => &mut self.surroundings,
            "交通出行" => &mut self.transport,
            "税费解析" => &mut self.tax_analysis,
            "权属抵押" => &mut self.ownership_mortgage,
            "上次交易" => &mut self.last_transaction,
            "挂牌时间" => &mut self.listed_at,
            "交易权属" => &mut self.transaction_rights,
            "房屋用途" => &mut self.usage,
            "房屋年限" => &mut self.property_term,
            "产权所属" => &mut self.ownership_type,
            "抵押信息" => &mut self.mortgage_info,
            "交易属性" => &mut self.transaction_attributes,
            "户型分间" => &mut self.room_breakdown,
            _ => return None,
        };
        Some(field)
    }

    /// Values in `DETAIL_HEADER` order
    pub fn to_row(&self) -> [&str; 16] {
        [
            &self.tags,
            &self.selling_points,
            &self.community_intro,
            &self.surroundings,
            &self.transport,
            &self.tax_analysis,
            &self.ownership_mortgage,
            &self.last_transaction,
            &self.listed_at,
            &self.transaction_rights,
            &self.usage,
            &self.property_term,
            &self.ownership_type,
            &self.mortgage_info,
            &self.transaction_attributes,
            &self.room_breakdown,
        ]
    }
}

/// Outcome of scraping one listing's detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DetailStatus {
    Ok,
    LoginRequired,
    NoLink,
    Failed(String),
}

impl DetailStatus {
    const MAX_FAILURE_LEN: usize = 120;

    pub fn failed(err: impl std::fmt::Display) -> Self {
        let message: String = format!("failed: {err}")
            .chars()
            .take(Self::MAX_FAILURE_LEN)
            .collect();
        DetailStatus::Failed(message)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DetailStatus::Ok => "ok",
            DetailStatus::LoginRequired => "login_required",
            DetailStatus::NoLink => "no_link",
            DetailStatus::Failed(message) => message,
        }
    }
}

impl From<DetailStatus> for String {
    fn from(status: DetailStatus) -> Self {
        status.as_str().to_string()
    }
}

impl From<String> for DetailStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ok" => DetailStatus::Ok,
            "login_required" => DetailStatus::LoginRequired,
            "no_link" => DetailStatus::NoLink,
            _ => DetailStatus::Failed(value),
        }
    }
}

/// A listing joined with its detail record by link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailRow {
    #[serde(flatten)]
    pub listing: ListingRecord,
    pub detail: DetailRecord,
    pub status: DetailStatus,
}

impl DetailRow {
    pub fn header() -> Vec<&'static str> {
        LISTING_HEADER
            .iter()
            .chain(DETAIL_HEADER.iter())
            .copied()
            .chain(std::iter::once(STATUS_HEADER))
            .collect()
    }

    pub fn to_row(&self) -> Vec<&str> {
        self.listing
            .to_row()
            .into_iter()
            .chain(self.detail.to_row())
            .chain(std::iter::once(self.status.as_str()))
            .collect()
    }
}
