use axum::extract::State;

use gumshoe_types::scenario::ScenarioSummary;

use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// GET /api/scenarios
pub async fn list_scenarios(State(state): State<AppState>) -> ApiResponse<Vec<ScenarioSummary>> {
    RequestTimer::start().success(state.gateway.scenarios())
}
