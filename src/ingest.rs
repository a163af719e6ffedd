use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::info;

use crate::loader::{self, LoadStats};
use crate::parser::{StoreCrawl, StoreKind};

/// Parse a crawl dump (one JSON page per line). Blank lines are skipped; any
/// other bad line aborts with its line number.
pub fn read_crawl(path: &Path, store: StoreKind) -> Result<StoreCrawl> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);

    let pb = ProgressBar::new(size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {bytes}/{total_bytes} ({bytes_per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut crawl = StoreCrawl::new(store);
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {:?}", path))?;
        pb.inc(line.len() as u64 + 1);
        if line.trim().is_empty() {
            continue;
        }
        crawl
            .parse_line(idx + 1, &line)
            .with_context(|| format!("Failed to parse {:?}", path))?;
    }
    pb.finish_and_clear();

    info!(
        store = %store,
        detail_pages = crawl.product_pages.len(),
        listing_pages = crawl.overview_pages.len(),
        "crawl parsed"
    );
    Ok(crawl)
}

/// Parse then load one crawl dump.
pub fn ingest_file(conn: &mut Connection, path: &Path, store: StoreKind) -> Result<LoadStats> {
    let crawl = read_crawl(path, store)?;
    loader::load_store(conn, &crawl, &path.display().to_string())
}
