//! Read-only JSON API over the loaded store data.

use std::sync::{Arc, Mutex};

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::{self, BrandProductRow, NamedRow, ProductDetailRow};
use crate::error::ApiError;

const DEFAULT_OFFSET: i64 = 0;
const DEFAULT_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T, ApiError>) -> Result<T, ApiError> {
        let conn = self.conn.lock().map_err(|_| ApiError::Poisoned)?;
        f(&conn)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stores", get(stores))
        .route("/api/brands", get(brands))
        .route("/api/products/{brand_id}", get(products_of_brand))
        .route("/api/products/{brand_id}/{offset}", get(products_of_brand_from))
        .route("/api/products/{brand_id}/{offset}/{limit}", get(products_of_brand_page))
        .route("/api/product/{product_id}/{store_id}", get(product_detail))
        .fallback(|| async { ApiError::NotFound })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(conn: Connection, bind: &str) -> anyhow::Result<()> {
    let app = router(AppState::new(conn));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Query API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn stores(State(state): State<AppState>) -> Result<Json<Vec<NamedRow>>, ApiError> {
    let rows = state.with_conn(|c| Ok(db::fetch_stores(c)?))?;
    Ok(Json(rows))
}

async fn brands(State(state): State<AppState>) -> Result<Json<Vec<NamedRow>>, ApiError> {
    let rows = state.with_conn(|c| Ok(db::fetch_brands(c)?))?;
    Ok(Json(rows))
}

async fn products_of_brand(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<BrandProductRow>>, ApiError> {
    let Path(brand_id) = path?;
    brand_page(&state, brand_id, DEFAULT_OFFSET, DEFAULT_LIMIT)
}

async fn products_of_brand_from(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<Vec<BrandProductRow>>, ApiError> {
    let Path((brand_id, offset)) = path?;
    brand_page(&state, brand_id, offset, DEFAULT_LIMIT)
}

async fn products_of_brand_page(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64, i64)>, PathRejection>,
) -> Result<Json<Vec<BrandProductRow>>, ApiError> {
    let Path((brand_id, offset, limit)) = path?;
    brand_page(&state, brand_id, offset, limit)
}

fn brand_page(
    state: &AppState,
    brand_id: i64,
    offset: i64,
    limit: i64,
) -> Result<Json<Vec<BrandProductRow>>, ApiError> {
    let rows = state.with_conn(|c| {
        if !db::brand_exists(c, brand_id)? {
            return Err(ApiError::NotFound);
        }
        Ok(db::fetch_products_by_brand(c, brand_id, offset.max(0), limit.max(0))?)
    })?;
    Ok(Json(rows))
}

async fn product_detail(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<ProductDetailRow>, ApiError> {
    let Path((product_id, store_id)) = path?;
    let row = state.with_conn(|c| db::fetch_product_detail(c, product_id, store_id)?.ok_or(ApiError::NotFound))?;
    Ok(Json(row))
}
