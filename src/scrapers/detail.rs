use scraper::{ElementRef, Html, Selector};

use crate::models::DetailRecord;
use crate::scrapers::layout::selector;
use crate::Result;

/// Shown instead of the attribute blocks when the session is not logged in
const LOGIN_MARKERS: [&str; 2] = ["登录查看更多房源信息", "需登录后查看完整信息"];

const TAGS_LABEL: &str = "房源标签";
const TRANSACTION_LABEL: &str = "交易属性";
const ROOMS_LABEL: &str = "户型分间";

/// Result of parsing one detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailParse {
    pub record: DetailRecord,
    pub login_required: bool,
}

/// Selectors for a detail page, parsed once per run
#[derive(Debug)]
pub struct DetailLayout {
    tags: Selector,
    sections: Selector,
    section_name: Selector,
    section_content: Selector,
    transaction_items: Selector,
    transaction_label: Selector,
    layout_rows: Selector,
}

impl DetailLayout {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tags: selector("div.newwrap.baseinform div.tags a")?,
            sections: selector("div.newwrap.baseinform div.baseattribute")?,
            section_name: selector("div.name")?,
            section_content: selector("div.content")?,
            transaction_items: selector("div.transaction li")?,
            transaction_label: selector("span.label")?,
            // row and col are both matched on a class substring
            layout_rows: selector(r#"div.layout-wrapper div[class*="row"]"#)?,
        })
    }
}

/// Extract the long-form fields of a listing's detail page.
/// Sections the page lacks stay empty.
pub fn parse_detail_page(html: &str, sel: &DetailLayout) -> DetailParse {
    if LOGIN_MARKERS.iter().any(|marker| html.contains(marker)) {
        return DetailParse {
            record: DetailRecord::default(),
            login_required: true,
        };
    }

    let doc = Html::parse_document(html);
    let mut record = DetailRecord::default();

    let tags = non_blank(doc.select(&sel.tags).flat_map(|a| a.text()));
    set_label(&mut record, TAGS_LABEL, tags.join(" | "));

    // 核心卖点, 小区介绍, 周边配套, ... keyed by their own heading
    for section in doc.select(&sel.sections) {
        let Some(name) = section.select(&sel.section_name).next() else {
            continue;
        };
        let title = collect_text(name);
        let content = section
            .select(&sel.section_content)
            .map(collect_text)
            .collect::<String>();
        if !title.is_empty() && !content.is_empty() {
            set_label(&mut record, &title, content);
        }
    }

    let mut pairs = Vec::new();
    for item in doc.select(&sel.transaction_items) {
        let label = item
            .select(&sel.transaction_label)
            .map(collect_text)
            .collect::<String>();
        let value = child_elements(item)
            .filter(|el| el.value().name() == "span")
            .skip(1)
            .map(collect_text)
            .collect::<String>();
        if !label.is_empty() && !value.is_empty() {
            pairs.push(format!("{label}:{value}"));
            set_label(&mut record, &label, value);
        }
    }
    set_label(&mut record, TRANSACTION_LABEL, pairs.join(" | "));

    let rooms: Vec<String> = doc
        .select(&sel.layout_rows)
        .map(|row| {
            child_elements(row)
                .filter(|el| el.value().name() == "div" && el.value().classes().any(|c| c.contains("col")))
                .map(collect_text)
                .filter(|col| !col.is_empty())
                .collect::<Vec<_>>()
                .join(" / ")
        })
        .filter(|row| !row.is_empty())
        .collect();
    set_label(&mut record, ROOMS_LABEL, rooms.join(" ; "));

    DetailParse {
        record,
        login_required: false,
    }
}

fn set_label(record: &mut DetailRecord, label: &str, value: String) {
    if value.is_empty() {
        return;
    }
    if let Some(field) = record.field_by_label(label.trim()) {
        *field = value;
    }
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// All text under `el`, concatenated and trimmed
fn collect_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn non_blank<'a>(texts: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    texts.map(str::trim).filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"<html><body>
<div class="newwrap baseinform">
  <div class="introContent showbasemore">
    <div class="tags clear"><div class="name">房源标签</div><div class="content"><a class="tag is_vr">VR房源</a><a class="tag taxfree">房本满五年</a></div></div>
    <div class="baseattribute clear"><div class="name">核心卖点</div><div class="content">南北通透，
      采光好</div></div>
    <div class="baseattribute clear"><div class="name">小区介绍</div><div class="content">小区绿化率高</div></div>
    <div class="baseattribute clear"><div class="name">交通出行</div><div class="content">距地铁站<b>300米</b></div></div>
    <div class="baseattribute clear"><div class="name">装修描述</div><div class="content">not a column</div></div>
    <div class="baseattribute clear"><div class="content">nameless</div></div>
  </div>
</div>
<div class="transaction">
  <div class="content"><ul>
    <li><span class="label">挂牌时间</span><span>2024-05-01</span></li>
    <li><span class="label">交易权属</span><span>商品房</span></li>
    <li><span class="label">房屋用途</span><span>普通住宅</span></li>
    <li><span class="label">抵押信息</span><span style="padding-left:64px">
      无抵押</span></li>
    <li><span class="label">房本备件</span><span></span></li>
  </ul></div>
</div>
<div class="layout-wrapper">
  <div class="row"><div class="col">客厅</div><div class="col">30.5平米</div><div class="col">南</div></div>
  <div class="row"><div class="col">卧室A</div><div class="col">15平米</div><div class="col"></div></div>
  <div class="row"></div>
  <div class="layout-row clear"><div class="col">阳台</div><div class="col">4平米</div></div>
</div>
</body></html>"#;

    fn parse(html: &str) -> DetailParse {
        parse_detail_page(html, &DetailLayout::new().unwrap())
    }

    #[test]
    fn extracts_detail_sections() {
        let parsed = parse(DETAIL_PAGE);
        assert!(!parsed.login_required);

        let d = parsed.record;
        assert_eq!(d.tags, "VR房源 | 房本满五年");
        assert!(d.selling_points.starts_with("南北通透"));
        assert!(d.selling_points.ends_with("采光好"));
        assert_eq!(d.community_intro, "小区绿化率高");
        assert_eq!(d.transport, "距地铁站300米");
        assert_eq!(d.listed_at, "2024-05-01");
        assert_eq!(d.transaction_rights, "商品房");
        assert_eq!(d.usage, "普通住宅");
        assert_eq!(d.mortgage_info, "无抵押");
        assert_eq!(
            d.transaction_attributes,
            "挂牌时间:2024-05-01 | 交易权属:商品房 | 房屋用途:普通住宅 | 抵押信息:无抵押"
        );
        assert_eq!(d.room_breakdown, "客厅 / 30.5平米 / 南 ; 卧室A / 15平米 ; 阳台 / 4平米");
    }

    #[test]
    fn missing_sections_stay_empty() {
        let parsed = parse(DETAIL_PAGE).record;
        assert_eq!(parsed.surroundings, "");
        assert_eq!(parsed.tax_analysis, "");
        assert_eq!(parsed.last_transaction, "");

        let empty = parse("<html><body><p>nothing here</p></body></html>");
        assert_eq!(empty, DetailParse::default());
    }

    #[test]
    fn login_wall_is_flagged() {
        let parsed = parse("<div>登录查看更多房源信息</div>");
        assert!(parsed.login_required);
        assert_eq!(parsed.record, DetailRecord::default());
    }
}
