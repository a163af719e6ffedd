pub mod price;
pub mod stores;

use std::collections::HashMap;

use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::{ExtractError, MissingField};

/// One crawled page, as written by the crawler (one JSON object per line).
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    pub page_type: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub page_url: String,
    #[serde(default)]
    pub product_category: Option<Vec<String>>,
    #[serde(default)]
    pub page_number: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetail {
    pub brand: String,
    pub product_name: String,
    pub product_type: String,
    pub price: String,
    pub product_page: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewPage {
    pub product_category: Vec<String>,
    pub page_number: i64,
    pub product_urls: Vec<String>,
}

/// Per-retailer extraction rules. Every store implements both page kinds.
pub trait StoreExtractor {
    fn parse_detail_page(&self, page: &RawPage) -> ProductDetail;

    fn parse_overview_page(&self, page: &RawPage) -> Result<OverviewPage, MissingField>;
}

pub use stores::StoreKind;

/// Everything parsed for one store before it is loaded.
#[derive(Debug)]
pub struct StoreCrawl {
    pub store: StoreKind,
    pub product_pages: HashMap<String, ProductDetail>,
    pub overview_pages: Vec<OverviewPage>,
}

impl StoreCrawl {
    pub fn new(store: StoreKind) -> Self {
        StoreCrawl {
            store,
            product_pages: HashMap::new(),
            overview_pages: Vec::new(),
        }
    }

    /// Parse one JSONL line (1-based `line`) and file it under the right collection.
    pub fn parse_line(&mut self, line: usize, json: &str) -> Result<(), ExtractError> {
        let page: RawPage =
            serde_json::from_str(json).map_err(|source| ExtractError::Json { line, source })?;
        self.parse(line, &page)
    }

    pub fn parse(&mut self, line: usize, page: &RawPage) -> Result<(), ExtractError> {
        let extractor = self.store.extractor();
        match page.page_type.as_str() {
            "product_detail" => {
                let detail = extractor.parse_detail_page(page);
                self.product_pages.insert(detail.product_page.clone(), detail);
            }
            "product_listing" => {
                let overview = extractor
                    .parse_overview_page(page)
                    .map_err(|MissingField(field)| ExtractError::MissingField { line, field })?;
                self.overview_pages.push(overview);
            }
            other => {
                return Err(ExtractError::UnknownPageType {
                    line,
                    page_type: other.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Shared part of every overview parse: metadata copied from the crawl record.
pub(crate) fn overview_meta(page: &RawPage) -> Result<(Vec<String>, i64), MissingField> {
    let page_number = page.page_number.ok_or(MissingField("page_number"))?;
    let category = page.product_category.clone().unwrap_or_default();
    Ok((category, page_number))
}

// ── HTML helpers ──

/// First direct text node of the first matching element that has one, trimmed.
pub(crate) fn first_text(doc: &Html, sel: &Selector) -> String {
    doc.select(sel)
        .find_map(|el| el.children().find_map(|c| c.value().as_text().map(|t| t.trim().to_string())))
        .unwrap_or_default()
}

/// Attribute of the first matching element that carries it, trimmed.
pub(crate) fn first_attr(doc: &Html, sel: &Selector, attr: &str) -> String {
    doc.select(sel)
        .find_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Attribute of every matching element, in document order.
pub(crate) fn all_attrs(doc: &Html, sel: &Selector, attr: &str) -> Vec<String> {
    doc.select(sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_line(url: &str) -> String {
        serde_json::json!({
            "page_type": "product_detail",
            "body": "<html><body><h1 itemprop=\"name\">Sneaker</h1></body></html>",
            "page_url": url,
        })
        .to_string()
    }

    #[test]
    fn dispatches_detail_and_listing() {
        let mut crawl = StoreCrawl::new(StoreKind::Omoda);
        crawl.parse_line(1, &detail_line("https://www.omoda.nl/p1")).unwrap();
        let listing = serde_json::json!({
            "page_type": "product_listing",
            "body": "<a class=\"artikel-link\" href=\"https://www.omoda.nl/p1\">x</a>",
            "page_url": "https://www.omoda.nl/dames",
            "product_category": ["Dames", "Schoenen"],
            "page_number": 2,
        })
        .to_string();
        crawl.parse_line(2, &listing).unwrap();

        assert_eq!(crawl.product_pages.len(), 1);
        assert_eq!(crawl.product_pages["https://www.omoda.nl/p1"].product_name, "Sneaker");
        assert_eq!(crawl.overview_pages.len(), 1);
        assert_eq!(crawl.overview_pages[0].page_number, 2);
        assert_eq!(crawl.overview_pages[0].product_category, vec!["Dames", "Schoenen"]);
    }

    #[test]
    fn unknown_page_type_is_fatal() {
        let mut crawl = StoreCrawl::new(StoreKind::Ziengs);
        let err = crawl
            .parse_line(7, r#"{"page_type": "homepage", "body": "", "page_url": "x"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnknownPageType { line: 7, ref page_type } if page_type == "homepage"));
        assert!(crawl.product_pages.is_empty());
    }

    #[test]
    fn listing_without_page_number_is_fatal() {
        let mut crawl = StoreCrawl::new(StoreKind::Zalando);
        let err = crawl
            .parse_line(3, r#"{"page_type": "product_listing", "body": "", "page_url": "x"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingField { line: 3, field: "page_number" }));
    }

    #[test]
    fn extractor_reports_missing_field_without_line() {
        let page: RawPage =
            serde_json::from_str(r#"{"page_type": "product_listing", "body": "", "page_url": "x"}"#).unwrap();
        let err = StoreKind::Omoda.extractor().parse_overview_page(&page).unwrap_err();
        assert_eq!(err.0, "page_number");
        assert_eq!(err.to_string(), "missing field `page_number`");
    }

    #[test]
    fn crawl_is_debug_printable() {
        let crawl = StoreCrawl::new(StoreKind::Ziengs);
        let text = format!("{:?}", crawl);
        assert!(text.contains("Ziengs"));
    }

    #[test]
    fn listing_without_category_has_empty_path() {
        let mut crawl = StoreCrawl::new(StoreKind::Omoda);
        crawl
            .parse_line(1, r#"{"page_type": "product_listing", "body": "", "page_url": "x", "page_number": 1}"#)
            .unwrap();
        assert!(crawl.overview_pages[0].product_category.is_empty());
        assert!(crawl.overview_pages[0].product_urls.is_empty());
    }

    #[test]
    fn bad_json_reports_line() {
        let mut crawl = StoreCrawl::new(StoreKind::Omoda);
        let err = crawl.parse_line(12, "{not json").unwrap_err();
        assert!(matches!(err, ExtractError::Json { line: 12, .. }));
    }

    #[test]
    fn later_detail_replaces_earlier() {
        let mut crawl = StoreCrawl::new(StoreKind::Omoda);
        crawl.parse_line(1, &detail_line("u")).unwrap();
        crawl.parse_line(2, &detail_line("u")).unwrap();
        assert_eq!(crawl.product_pages.len(), 1);
    }

    #[test]
    fn first_text_skips_nested_markup() {
        let doc = Html::parse_document("<h1 class=\"t\"><span>inner</span></h1><h1 class=\"t\">  outer  </h1>");
        let sel = Selector::parse("h1.t").unwrap();
        assert_eq!(first_text(&doc, &sel), "outer");
    }

    #[test]
    fn missing_nodes_are_empty() {
        let doc = Html::parse_document("<p>nothing here</p>");
        let sel = Selector::parse("meta[itemprop=\"price\"]").unwrap();
        assert_eq!(first_text(&doc, &sel), "");
        assert_eq!(first_attr(&doc, &sel, "content"), "");
        assert!(all_attrs(&doc, &sel, "content").is_empty());
    }
}
