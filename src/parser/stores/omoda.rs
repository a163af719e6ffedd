use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::MissingField;
use crate::parser::{all_attrs, first_attr, first_text, overview_meta, price};
use crate::parser::{OverviewPage, ProductDetail, RawPage, StoreExtractor};

static BRAND: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"h2[itemprop="brand"]"#).unwrap());
static NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"h1[itemprop="name"]"#).unwrap());
static PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div#artikel-prijs > meta[itemprop="price"]"#).unwrap());
static PRODUCT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[class*="artikel-link"]"#).unwrap());

/// omoda.nl: microdata on the detail page, absolute links on listings.
pub struct Omoda;

impl StoreExtractor for Omoda {
    fn parse_detail_page(&self, page: &RawPage) -> ProductDetail {
        let doc = Html::parse_document(&page.body);
        ProductDetail {
            brand: first_text(&doc, &BRAND),
            product_name: first_text(&doc, &NAME),
            product_type: String::new(),
            price: price::normalize(&first_attr(&doc, &PRICE, "content")),
            product_page: page.page_url.clone(),
        }
    }

    fn parse_overview_page(&self, page: &RawPage) -> Result<OverviewPage, MissingField> {
        let (product_category, page_number) = overview_meta(page)?;
        let doc = Html::parse_document(&page.body);
        Ok(OverviewPage {
            product_category,
            page_number,
            product_urls: all_attrs(&doc, &PRODUCT_LINK, "href"),
        })
    }
}
