use axum::extract::{Query, State};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::ApiResponse;
use crate::services::FundOverview;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FundQuery {
    /// Defaults to the configured active fund
    pub id: Option<String>,
}

/// GET /api/fund - fund details, donations and live totals
pub async fn fund_get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FundQuery>,
) -> ApiResult<ApiResponse<FundOverview>> {
    let fund_id = state.funds.resolve_fund_id(query.id.as_deref())?;
    let overview = state.funds.overview(fund_id).await?;

    Ok(ApiResponse::success(overview).no_store())
}
