use std::sync::Arc;

use analysis_core::{FinancialRecord, StockAnalysis};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

const SEARCH_UPSTREAM: &str = "https://www.screener.in/api/company/search/";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/search", get(search))
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Company name or screener slug.
    #[serde(alias = "companyName", alias = "slug")]
    pub company: Option<String>,
    /// Populated financial record from the data-fetch collaborator.
    #[serde(default)]
    pub data: FinancialRecord,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: StockAnalysis,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "message": "Stock Analysis API is running"
    }))
}

/// Score a posted financial record. Non-finite numbers in the record are
/// normalized to absent before scoring.
async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let company = req
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Company name or slug is required".to_string()))?
        .to_string();

    tracing::info!(company, "analyze request");
    let record = req.data.sanitize();
    let analysis = state.analyzer.analyze(&company, &record);

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
    }))
}

/// Proxy the upstream screener company-search endpoint.
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Query parameter is required".to_string()))?
        .to_string();

    let results: serde_json::Value = state
        .http
        .get(SEARCH_UPSTREAM)
        .query(&[("q", query.as_str())])
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| {
            tracing::warn!(error = %e, "company search upstream failed");
            AppError::Upstream("Failed to fetch from upstream search".to_string())
        })?
        .json()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "company search returned malformed JSON");
            AppError::Upstream("Malformed upstream search response".to_string())
        })?;

    Ok(Json(serde_json::json!({
        "success": true,
        "results": results,
        "query": query
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        crate::app(Arc::new(AppState::new()))
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["status"], "OK");
    }

    #[tokio::test]
    async fn analyze_round_trips_a_record() {
        let payload = serde_json::json!({
            "company": "PETRONET",
            "data": {
                "latestEPS": 23.95,
                "bookValue": 137.0,
                "stockPE": 11.9,
                "industryPE": 8.0,
                "profitGrowth5Y": 7.0,
                "debtToEquity": 0.12,
                "currentPrice": 285.0
            }
        });

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["analysis"]["company"], "PETRONET");
        // Priced above its sell band: 285 vs fair value ≈ 219.68.
        assert_eq!(json["analysis"]["valuation"]["priceZone"], "STRONG_SELL");
        assert_eq!(json["analysis"]["scoresAbove7"], 0);
    }

    #[tokio::test]
    async fn analyze_without_company_is_bad_request() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"data":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["error"], "Bad request");
    }

    #[tokio::test]
    async fn search_without_query_is_bad_request() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/search")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analyze_normalizes_non_finite_input() {
        // JSON cannot carry NaN, but a null-heavy record must still produce
        // a well-formed DATA_INSUFFICIENT result rather than an error.
        let payload = serde_json::json!({ "company": "GHOST", "data": {} });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["analysis"]["finalDecision"], "DATA_INSUFFICIENT");
    }
}
