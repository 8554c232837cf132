use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde_json::json;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use canvass_core::Resident;

use crate::canvass::config_reader::CanvassConfig;
use crate::canvass::sheets::SheetsBackend;
use crate::canvass::store::StoreAdapter;
use crate::canvass::*;

/// A failed request: logged with its cause, reported to the client as a 500.
struct ApiError(&'static str);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0 })),
        )
            .into_response()
    }
}

fn failed(message: &'static str) -> impl FnOnce(CanvassError) -> ApiError {
    move |e| {
        error!("{}: {}", message, e);
        ApiError(message)
    }
}

// A body that cannot be read fails like the request itself.
fn rejected(message: &'static str) -> impl FnOnce(JsonRejection) -> ApiError {
    move |e| {
        warn!("{}: unreadable request body: {}", message, e.body_text());
        ApiError(message)
    }
}

type ApiResult = Result<Json<JSValue>, ApiError>;

pub fn router(store: StoreAdapter) -> Router {
    Router::new()
        .route("/add-resident", post(add_resident))
        .route("/update-resident", post(update_resident))
        .route("/sync-residents", post(sync_residents))
        .route("/fetch-residents", get(fetch_residents))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(store))
}

/// Runs the backend until the process stops.
///
/// The spreadsheet settings are checked before binding: a misconfigured server
/// does not start.
pub async fn serve(config: &CanvassConfig) -> CanvassResult<()> {
    let store_config = config.store_config()?;
    let backend = SheetsBackend::new(&store_config)?;
    let store = StoreAdapter::new(Arc::new(backend), &store_config.sheet_name);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .context(ServingSnafu { addr: addr.clone() })?;
    info!("Backend running on http://{}", addr);
    axum::serve(listener, router(store))
        .await
        .context(ServingSnafu { addr })
}

async fn add_resident(
    State(store): State<Arc<StoreAdapter>>,
    body: Result<Json<Resident>, JsonRejection>,
) -> ApiResult {
    let Json(r) = body.map_err(rejected("Failed to add resident"))?;
    info!("/add-resident: {:?}", r.name);
    store
        .add_resident(&r)
        .await
        .map_err(failed("Failed to add resident"))?;
    Ok(Json(json!({ "success": true })))
}

async fn update_resident(
    State(store): State<Arc<StoreAdapter>>,
    body: Result<Json<Resident>, JsonRejection>,
) -> ApiResult {
    let Json(r) = body.map_err(rejected("Update failed"))?;
    info!("/update-resident: serial {:?}", r.serial_no);
    let mode = store
        .update_resident(&r)
        .await
        .map_err(failed("Update failed"))?;
    Ok(Json(json!({ "success": true, "mode": mode })))
}

async fn sync_residents(
    State(store): State<Arc<StoreAdapter>>,
    body: Result<Json<Vec<Resident>>, JsonRejection>,
) -> ApiResult {
    let Json(rs) = body.map_err(rejected("Sync failed"))?;
    info!("/sync-residents: {} rows received", rs.len());
    let count = store
        .sync_residents(&rs)
        .await
        .map_err(failed("Sync failed"))?;
    Ok(Json(json!({ "success": true, "count": count })))
}

async fn fetch_residents(State(store): State<Arc<StoreAdapter>>) -> ApiResult {
    let residents = store
        .fetch_residents()
        .await
        .map_err(failed("Fetch failed"))?;
    info!("/fetch-residents: {} residents loaded", residents.len());
    Ok(Json(json!({ "success": true, "residents": residents })))
}
