use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/healthcheck", get(healthcheck))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn healthcheck(State(state): State<AppState>) -> AppResult<ApiResponse<Health>> {
    let conn = state.db.get()?;
    conn.query_row("SELECT 1", [], |_| Ok(()))?;
    Ok(ApiResponse::ok(Health { status: "OK" }, "Healthcheck passed"))
}
