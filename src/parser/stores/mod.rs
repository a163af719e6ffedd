pub mod omoda;
pub mod zalando;
pub mod ziengs;

use std::fmt;

use serde::Deserialize;

use super::StoreExtractor;

/// The retailers we know how to read. Selected once per input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Omoda,
    Ziengs,
    Zalando,
}

impl StoreKind {
    /// Store name as persisted in the `stores` table.
    pub fn name(self) -> &'static str {
        match self {
            StoreKind::Omoda => "Omoda",
            StoreKind::Ziengs => "Ziengs",
            StoreKind::Zalando => "Zalando",
        }
    }

    pub fn extractor(self) -> &'static dyn StoreExtractor {
        match self {
            StoreKind::Omoda => &omoda::Omoda,
            StoreKind::Ziengs => &ziengs::Ziengs,
            StoreKind::Zalando => &zalando::Zalando,
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::parser::RawPage;

    pub fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    pub fn detail(body: String, url: &str) -> RawPage {
        RawPage {
            page_type: "product_detail".into(),
            body,
            page_url: url.into(),
            product_category: None,
            page_number: None,
        }
    }

    pub fn listing(body: String, category: &[&str], page_number: i64) -> RawPage {
        RawPage {
            page_type: "product_listing".into(),
            body,
            page_url: "https://example.invalid/listing".into(),
            product_category: Some(category.iter().map(|c| c.to_string()).collect()),
            page_number: Some(page_number),
        }
    }
}
