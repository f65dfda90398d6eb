use axum::{extract::State, Extension, Json};

use stockfeed_core::{build_document, CatalogDocument};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

/// `GET /api/v1/catalog`
///
/// Returns the full catalog document, `{"success": true, "products": [...]}`.
/// This is the published wire shape, emitted verbatim from the engine rather
/// than wrapped in the `{data, meta}` envelope the other routes use.
pub(super) async fn get_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<CatalogDocument>, ApiError> {
    let rows = stockfeed_db::fetch_catalog_rows(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let prices = stockfeed_db::load_price_book(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let document = build_document(&rows, &prices, &state.settings);
    tracing::debug!(
        groups = document.products.len(),
        prices = prices.len(),
        "catalog document assembled"
    );
    Ok(Json(document))
}
