//! City name → LianJia subdomain lookup.

const CITY_CODES: &[(&str, &str)] = &[
    ("北京", "bj"),
    ("上海", "sh"),
    ("广州", "gz"),
    ("深圳", "sz"),
    ("天津", "tj"),
    ("重庆", "cq"),
    ("成都", "cd"),
    ("杭州", "hz"),
    ("南京", "nj"),
    ("武汉", "wh"),
    ("西安", "xa"),
    ("苏州", "su"),
    ("长沙", "cs"),
    ("郑州", "zz"),
    ("青岛", "qd"),
    ("大连", "dl"),
    ("厦门", "xm"),
    ("合肥", "hf"),
    ("济南", "jn"),
    ("沈阳", "sy"),
    ("石家庄", "sjz"),
    ("福州", "fz"),
    ("东莞", "dg"),
    ("佛山", "fs"),
    ("珠海", "zh"),
    ("中山", "zs"),
    ("惠州", "hui"),
    ("无锡", "wx"),
    ("烟台", "yt"),
    ("昆明", "km"),
    ("南昌", "nc"),
    ("太原", "ty"),
    ("廊坊", "lf"),
    ("哈尔滨", "hrb"),
    ("长春", "cc"),
    ("贵阳", "gy"),
    ("南宁", "nn"),
    ("海口", "hk"),
    ("宁波", "nb"),
    ("温州", "wz"),
    ("绍兴", "sx"),
    ("嘉兴", "jx"),
    ("常州", "changzhou"),
    ("徐州", "xz"),
    ("泉州", "quanzhou"),
    ("兰州", "lz"),
    ("乌鲁木齐", "wlmq"),
    ("呼和浩特", "hhht"),
    ("三亚", "san"),
    ("保定", "bd"),
];

/// Subdomain code for a city name, e.g. `深圳` → `sz`.
pub fn city_code(name: &str) -> Option<&'static str> {
    let name = name.trim();
    CITY_CODES
        .iter()
        .find(|(city, _)| *city == name)
        .map(|(_, code)| *code)
}

/// First page URL is `pg1`; the site accepts it the same as the bare listing path.
pub fn list_page_url(code: &str, page: u32) -> String {
    format!("https://{code}.lianjia.com/ershoufang/pg{page}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_cities_resolve() {
        assert_eq!(city_code("深圳"), Some("sz"));
        assert_eq!(city_code(" 北京 "), Some("bj"));
        assert_eq!(city_code("Gotham"), None);
    }

    #[test]
    fn page_url_embeds_code_and_page() {
        assert_eq!(list_page_url("sz", 7), "https://sz.lianjia.com/ershoufang/pg7/");
    }
}
