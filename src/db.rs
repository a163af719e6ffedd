use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS stores (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS brands (
            id    INTEGER PRIMARY KEY,
            name  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_brands_name ON brands(name);

        -- Category identity is (name, parent_id); names repeat across parents.
        CREATE TABLE IF NOT EXISTS categories (
            id         INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            parent_id  INTEGER REFERENCES categories(id)
        );
        CREATE INDEX IF NOT EXISTS idx_categories_name_parent ON categories(name, parent_id);

        CREATE TABLE IF NOT EXISTS products (
            id             INTEGER PRIMARY KEY,
            name           TEXT NOT NULL,
            type           TEXT,
            price          NUMERIC(12,2),
            page_position  INTEGER NOT NULL,
            page_number    INTEGER NOT NULL,
            category_id    INTEGER REFERENCES categories(id),
            brand_id       INTEGER REFERENCES brands(id),
            store_id       INTEGER REFERENCES stores(id)
        );
        CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand_id);
        CREATE INDEX IF NOT EXISTS idx_products_store ON products(store_id);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            id                 INTEGER PRIMARY KEY,
            store_id           INTEGER NOT NULL REFERENCES stores(id),
            source             TEXT NOT NULL,
            started_at         TEXT NOT NULL,
            finished_at        TEXT,
            products_inserted  INTEGER NOT NULL DEFAULT 0,
            products_skipped   INTEGER NOT NULL DEFAULT 0
        );
        ",
    )?;
    Ok(())
}

// ── Find-or-create ──

pub fn find_or_create_store(conn: &Connection, name: &str) -> Result<i64> {
    find_or_create_named(conn, "stores", name)
}

pub fn find_or_create_brand(conn: &Connection, name: &str) -> Result<i64> {
    find_or_create_named(conn, "brands", name)
}

/// `table` is always one of our own literal table names.
fn find_or_create_named(conn: &Connection, table: &str, name: &str) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE name = ?1 ORDER BY id LIMIT 1", table),
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(&format!("INSERT INTO {} (name) VALUES (?1)", table), params![name])?;
    Ok(conn.last_insert_rowid())
}

/// Exact (name, parent) match; a `None` parent only matches root categories.
pub fn find_category(conn: &Connection, name: &str, parent_id: Option<i64>) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM categories WHERE name = ?1 AND parent_id IS ?2 ORDER BY id LIMIT 1",
            params![name, parent_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn insert_category(conn: &Connection, name: &str, parent_id: Option<i64>) -> Result<i64> {
    conn.execute(
        "INSERT INTO categories (name, parent_id) VALUES (?1, ?2)",
        params![name, parent_id],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Products ──

pub struct NewProduct<'a> {
    pub name: &'a str,
    pub product_type: Option<&'a str>,
    pub price: Option<rust_decimal::Decimal>,
    pub page_position: i64,
    pub page_number: i64,
    pub category_id: Option<i64>,
    pub brand_id: i64,
    pub store_id: i64,
}

pub fn insert_product(conn: &Connection, p: &NewProduct) -> Result<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO products
         (name, type, price, page_position, page_number, category_id, brand_id, store_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    stmt.execute(params![
        p.name,
        p.product_type,
        p.price.map(|d| d.to_string()),
        p.page_position,
        p.page_number,
        p.category_id,
        p.brand_id,
        p.store_id,
    ])?;
    Ok(conn.last_insert_rowid())
}

// ── Ingest runs ──

pub fn start_run(conn: &Connection, store_id: i64, source: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingest_runs (store_id, source, started_at) VALUES (?1, ?2, ?3)",
        params![store_id, source, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_run(conn: &Connection, run_id: i64, inserted: usize, skipped: usize) -> Result<()> {
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?2, products_inserted = ?3, products_skipped = ?4
         WHERE id = ?1",
        params![run_id, chrono::Utc::now().to_rfc3339(), inserted as i64, skipped as i64],
    )?;
    Ok(())
}

// ── Queries ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedRow {
    pub id: i64,
    pub name: String,
}

pub fn fetch_stores(conn: &Connection) -> rusqlite::Result<Vec<NamedRow>> {
    fetch_named(conn, "SELECT id, name FROM stores ORDER BY id")
}

pub fn fetch_brands(conn: &Connection) -> rusqlite::Result<Vec<NamedRow>> {
    fetch_named(conn, "SELECT id, COALESCE(name, '') FROM brands ORDER BY id")
}

fn fetch_named(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<NamedRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(NamedRow {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn brand_exists(conn: &Connection, brand_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM brands WHERE id = ?1)",
        params![brand_id],
        |r| r.get(0),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandProductRow {
    pub id: i64,
    pub name: String,
    pub store: Option<NamedRow>,
}

pub fn fetch_products_by_brand(
    conn: &Connection,
    brand_id: i64,
    offset: i64,
    limit: i64,
) -> rusqlite::Result<Vec<BrandProductRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, s.id, s.name
         FROM products p
         LEFT JOIN stores s ON s.id = p.store_id
         WHERE p.brand_id = ?1
         ORDER BY p.id
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![brand_id, limit, offset], |row| {
            Ok(BrandProductRow {
                id: row.get(0)?,
                name: row.get(1)?,
                store: named_pair(row.get(2)?, row.get(3)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetailRow {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub price: Option<f64>,
    pub position: i64,
    pub page: i64,
    pub category: Option<NamedRow>,
    pub brand: Option<NamedRow>,
}

pub fn fetch_product_detail(
    conn: &Connection,
    product_id: i64,
    store_id: i64,
) -> rusqlite::Result<Option<ProductDetailRow>> {
    conn.query_row(
        "SELECT p.id, p.name, p.type, p.price, p.page_position, p.page_number,
                c.id, c.name, b.id, b.name
         FROM products p
         LEFT JOIN categories c ON c.id = p.category_id
         LEFT JOIN brands b ON b.id = p.brand_id
         WHERE p.id = ?1 AND p.store_id = ?2",
        params![product_id, store_id],
        |row| {
            Ok(ProductDetailRow {
                id: row.get(0)?,
                name: row.get(1)?,
                product_type: row.get(2)?,
                price: row.get(3)?,
                position: row.get(4)?,
                page: row.get(5)?,
                category: named_pair(row.get(6)?, row.get(7)?),
                brand: named_pair(row.get(8)?, row.get(9)?),
            })
        },
    )
    .optional()
}

fn named_pair(id: Option<i64>, name: Option<String>) -> Option<NamedRow> {
    id.map(|id| NamedRow {
        id,
        name: name.unwrap_or_default(),
    })
}

// ── Stats ──

pub struct Stats {
    pub stores: usize,
    pub brands: usize,
    pub categories: usize,
    pub products: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |table: &str| -> Result<usize> {
        let n: usize = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(n)
    };
    Ok(Stats {
        stores: count("stores")?,
        brands: count("brands")?,
        categories: count("categories")?,
        products: count("products")?,
    })
}

pub struct RunRow {
    pub id: i64,
    pub store: String,
    pub source: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub inserted: i64,
    pub skipped: i64,
}

pub fn fetch_recent_runs(conn: &Connection, limit: usize) -> Result<Vec<RunRow>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, s.name, r.source, r.started_at, r.finished_at,
                r.products_inserted, r.products_skipped
         FROM ingest_runs r
         JOIN stores s ON s.id = r.store_id
         ORDER BY r.id DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(RunRow {
                id: row.get(0)?,
                store: row.get(1)?,
                source: row.get(2)?,
                started_at: row.get(3)?,
                finished_at: row.get(4)?,
                inserted: row.get(5)?,
                skipped: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    init_schema(&conn).unwrap();
    conn
}
