use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, NewProduct};
use crate::parser::{price, StoreCrawl};
use crate::reconcile;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub pages: usize,
    pub inserted: usize,
    /// Listing URLs with no matching detail page.
    pub skipped_missing: usize,
    /// Saved products whose price did not parse; stored with a null price.
    pub unpriced: usize,
}

impl LoadStats {
    pub fn skipped(&self) -> usize {
        self.skipped_missing
    }

    pub fn print(&self) {
        println!(
            "Loaded {} listing pages: {} products saved ({} without price), {} without detail page.",
            self.pages, self.inserted, self.unpriced, self.skipped_missing,
        );
    }
}

/// Persist one store's crawl.
///
/// Listing pages are written in the order they were collected, each in its own
/// transaction: categories first, then the products in listing order with a
/// 1-based `page_position`. A listing URL without a detail page leaves a gap in
/// the positions. A price that does not parse is stored as null. Products are
/// always inserted, never updated.
pub fn load_store(conn: &mut Connection, crawl: &StoreCrawl, source: &str) -> Result<LoadStats> {
    let store_name = crawl.store.name();
    let store_id = db::find_or_create_store(conn, store_name)?;
    let run_id = db::start_run(conn, store_id, source)?;
    let mut stats = LoadStats::default();

    let pb = ProgressBar::new(crawl.overview_pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({per_sec})")?
            .progress_chars("#>-"),
    );

    for overview in &crawl.overview_pages {
        let tx = conn.transaction()?;
        let category_id = reconcile::resolve_category_path(&tx, &overview.product_category)
            .with_context(|| format!("Failed to resolve category {:?}", overview.product_category))?;

        for (idx, url) in overview.product_urls.iter().enumerate() {
            let Some(product) = crawl.product_pages.get(url) else {
                stats.skipped_missing += 1;
                continue;
            };
            let amount = price::to_decimal(&product.price);
            if amount.is_none() {
                warn!(url = %url, price = %product.price, "saving product without a usable price");
                stats.unpriced += 1;
            }

            let brand_id = db::find_or_create_brand(&tx, &product.brand)?;
            db::insert_product(
                &tx,
                &NewProduct {
                    name: &product.product_name,
                    product_type: Some(&product.product_type),
                    price: amount,
                    page_position: idx as i64 + 1,
                    page_number: overview.page_number,
                    category_id,
                    brand_id,
                    store_id,
                },
            )?;
            stats.inserted += 1;
        }

        tx.commit()?;
        stats.pages += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();
    db::finish_run(conn, run_id, stats.inserted, stats.skipped())?;
    info!(
        store = store_name,
        pages = stats.pages,
        inserted = stats.inserted,
        skipped = stats.skipped(),
        "store loaded"
    );
    Ok(stats)
}
