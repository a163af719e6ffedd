use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::MissingField;
use crate::parser::{all_attrs, first_attr, first_text, overview_meta, price};
use crate::parser::{OverviewPage, ProductDetail, RawPage, StoreExtractor};

const BASE_URL: &str = "http://www.ziengs.nl/";

static BRAND: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"meta[itemprop="brand"]"#).unwrap());
static NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"h1[itemprop="name"]"#).unwrap());
static PRICE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"meta[itemprop="price"]"#).unwrap());
static PRODUCT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div[class*="thumb"] > a"#).unwrap());

/// ziengs.nl: brand and price live in `<meta>` tags, listing links are `../`-relative.
pub struct Ziengs;

impl StoreExtractor for Ziengs {
    fn parse_detail_page(&self, page: &RawPage) -> ProductDetail {
        let doc = Html::parse_document(&page.body);
        ProductDetail {
            brand: first_attr(&doc, &BRAND, "content"),
            product_name: first_text(&doc, &NAME),
            product_type: String::new(),
            price: price::normalize(&first_attr(&doc, &PRICE, "content")),
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

fn absolute_url(link: &str) -> String {
    format!("{}{}", BASE_URL, link.replace("../", ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::stores::test_util::{detail, fixture, listing};

    #[test]
    fn detail_page() {
        let page = detail(fixture("ziengs_detail.html"), "http://www.ziengs.nl/heren/van-lier-veterschoen");
        let d = Ziengs.parse_detail_page(&page);
        assert_eq!(d.brand, "Van Lier");
        assert_eq!(d.product_name, "Veterschoen cognac");
        assert_eq!(d.price, "149.95");
    }

    #[test]
    fn relative_links_are_rebased() {
        assert_eq!(
            absolute_url("../../heren/van-lier-veterschoen"),
            "http://www.ziengs.nl/heren/van-lier-veterschoen"
        );
        assert_eq!(absolute_url("heren/x"), "http://www.ziengs.nl/heren/x");
    }

    #[test]
    fn overview_page() {
        let page = listing(fixture("ziengs_listing.html"), &["Heren", "Veterschoenen"], 3);
        let o = Ziengs.parse_overview_page(&page).unwrap();
        assert_eq!(o.page_number, 3);
        assert_eq!(
            o.product_urls,
            vec![
                "http://www.ziengs.nl/heren/van-lier-veterschoen",
                "http://www.ziengs.nl/heren/floris-van-bommel-loafer",
            ]
        );
    }
}
