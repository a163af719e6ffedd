use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::MissingField;
use crate::parser::{all_attrs, first_text, overview_meta, price};
use crate::parser::{OverviewPage, ProductDetail, RawPage, StoreExtractor};

const BASE_URL: &str = "https://www.zalando.nl/";

static BRAND: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"span[itemprop="brand"]"#).unwrap());
static NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"span[itemprop="name"]"#).unwrap());
static PRICE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"span[itemprop="price"]"#).unwrap());
static PRICE_FALLBACK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span#articlePrice").unwrap());
static PRODUCT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[class="catalogArticlesList_productBox"]"#).unwrap());

/// zalando.nl: price text is locale formatted ("€ 89,95"), listing links are root paths.
pub struct Zalando;

impl StoreExtractor for Zalando {
    fn parse_detail_page(&self, page: &RawPage) -> ProductDetail {
        let doc = Html::parse_document(&page.body);
        let mut raw_price = first_text(&doc, &PRICE);
        if raw_price.is_empty() {
            raw_price = first_text(&doc, &PRICE_FALLBACK);
        }
        ProductDetail {
            brand: first_text(&doc, &BRAND),
            product_name: first_text(&doc, &NAME),
            product_type: String::new(),
            price: price::normalize(&raw_price),
            product_page: page.page_url.clone(),
        }
    }

    fn parse_overview_page(&self, page: &RawPage) -> Result<OverviewPage, MissingField> {
        let (product_category, page_number) = overview_meta(page)?;
        let doc = Html::parse_document(&page.body);
        let product_urls = all_attrs(&doc, &PRODUCT_LINK, "href")
            .iter()
            .map(|link| absolute_url(link))
            .collect();
        Ok(OverviewPage {
            product_category,
            page_number,
            product_urls,
        })
    }
}

/// Zalando product paths are a single slug ("/nike-air-max-ni112a0.html"); slashes are dropped.
fn absolute_url(link: &str) -> String {
    format!("{}{}", BASE_URL, link.replace('/', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::stores::test_util::{detail, fixture, listing};

    #[test]
    fn detail_page() {
        let page = detail(fixture("zalando_detail.html"), "https://www.zalando.nl/nike-air-max-ni112a0.html");
        let d = Zalando.parse_detail_page(&page);
        assert_eq!(d.brand, "Nike Sportswear");
        assert_eq!(d.product_name, "AIR MAX 90 - Sneakers laag");
        assert_eq!(d.price, "139.95");
    }

    #[test]
    fn price_falls_back_to_article_price() {
        let body = r#"<span itemprop="name">Boot</span><span id="articlePrice">€ 79,95</span>"#.to_string();
        let d = Zalando.parse_detail_page(&detail(body, "u"));
        assert_eq!(d.price, "79.95");
    }

    #[test]
    fn no_price_is_empty_not_an_error() {
        let body = r#"<span itemprop="name">Boot</span>"#.to_string();
        let d = Zalando.parse_detail_page(&detail(body, "u"));
        assert_eq!(d.price, "");
        assert_eq!(d.product_name, "Boot");
    }

    #[test]
    fn overview_page_only_exact_class() {
        let page = listing(fixture("zalando_listing.html"), &["Heren", "Schoenen", "Sneakers"], 2);
        let o = Zalando.parse_overview_page(&page).unwrap();
        assert_eq!(o.product_category, vec!["Heren", "Schoenen", "Sneakers"]);
        assert_eq!(
            o.product_urls,
            vec![
                "https://www.zalando.nl/nike-air-max-ni112a0.html",
                "https://www.zalando.nl/vans-old-skool-va212b0.html",
            ]
        );
    }
}
