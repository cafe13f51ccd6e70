use axum::Json;
use axum::extract::State;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "database_available": state.db.is_some(),
        "page_limits": {
            "default": state.page_limits.default,
            "max": state.page_limits.max,
        },
        "observability": {
            "match_list_requests_total": observability.match_list_requests_total,
            "matches_created_total": observability.matches_created_total,
            "db_errors_total": observability.db_errors_total,
        }
    }))
}
