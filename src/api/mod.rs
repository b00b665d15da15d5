use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use crate::core::{
    Asset, AssetCatalog, Bucket, DEFAULT_PROJECTION_YEARS, MAX_PROJECTION_YEARS, Plan,
    PlanEvaluation, TimeFrame, WithdrawalPlan, evaluate_plan, initial_buckets,
};
use crate::export::{CURRENCIES, Currency, EXPORT_FILE_NAME, default_currency, export_plan_csv, find_currency};

const MAX_INFLATION_RATE: f64 = 20.0;

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<RwLock<AssetCatalog>>,
}

impl AppState {
    pub fn new(catalog: AssetCatalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
        }
    }

    async fn catalog_snapshot(&self) -> AssetCatalog {
        self.catalog.read().await.clone()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    total_capital: Option<f64>,
    buckets: Option<Vec<Bucket>>,
    withdrawal_plan: Option<WithdrawalPlan>,
    annual_withdrawal: Option<f64>,
    adjust_for_inflation: Option<bool>,
    inflation_rate: Option<f64>,
    time_frame: Option<TimeFrame>,
    years: Option<u32>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomAssetPayload {
    name: String,
    historical_return: f64,
}

#[derive(Debug)]
struct PlanRequest {
    plan: Plan,
    years: u32,
    currency: Currency,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    total_capital: f64,
    currency: Currency,
    withdrawal_plan: WithdrawalPlan,
    #[serde(flatten)]
    evaluation: PlanEvaluation,
}

#[derive(Debug, Serialize)]
struct AssetsResponse<'a> {
    assets: &'a [Asset],
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/assets", get(assets_handler))
        .route("/api/assets/custom", post(custom_asset_handler))
        .route("/api/currencies", get(currencies_handler))
        .route("/api/buckets/default", get(default_buckets_handler))
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .route("/api/export", post(export_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, catalog: AssetCatalog) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::new(catalog));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "retirement planner API listening");
    tracing::info!("local access: http://127.0.0.1:{port}/api/plan");

    axum::serve(listener, app).await
}

async fn assets_handler(State(state): State<AppState>) -> Response {
    let catalog = state.catalog_snapshot().await;
    json_response(
        StatusCode::OK,
        AssetsResponse {
            assets: catalog.assets(),
        },
    )
}

async fn custom_asset_handler(
    State(state): State<AppState>,
    Json(payload): Json<CustomAssetPayload>,
) -> Response {
    let mut catalog = state.catalog.write().await;
    let (next, id) = match catalog.add_custom_asset(&payload.name, payload.historical_return) {
        Ok(added) => added,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    *catalog = next;

    tracing::info!(%id, name = %payload.name, "custom asset added to session catalog");
    match catalog.get(&id) {
        Some(asset) => json_response(StatusCode::CREATED, asset),
        None => error_response(StatusCode::INTERNAL_SERVER_ERROR, "custom asset missing"),
    }
}

async fn currencies_handler() -> Response {
    json_response(StatusCode::OK, CURRENCIES)
}

async fn default_buckets_handler() -> Response {
    json_response(StatusCode::OK, initial_buckets())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(State(state): State<AppState>, Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(state, payload).await
}

async fn plan_post_handler(State(state): State<AppState>, Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(state, payload).await
}

async fn plan_handler_impl(state: AppState, payload: PlanPayload) -> Response {
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let catalog = state.catalog_snapshot().await;
    let evaluation = evaluate_plan(&request.plan, &catalog, request.years);
    if !evaluation.warnings.is_empty() {
        tracing::info!(
            warnings = evaluation.warnings.len(),
            "plan evaluated with configuration warnings"
        );
    }

    json_response(
        StatusCode::OK,
        PlanResponse {
            total_capital: request.plan.total_capital,
            currency: request.currency,
            withdrawal_plan: request.plan.withdrawal_plan,
            evaluation,
        },
    )
}

async fn export_handler(State(state): State<AppState>, Json(payload): Json<PlanPayload>) -> Response {
    export_handler_impl(state, payload).await
}

async fn export_handler_impl(state: AppState, payload: PlanPayload) -> Response {
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let catalog = state.catalog_snapshot().await;
    let csv = match export_plan_csv(&request.plan, &catalog, request.currency, request.years) {
        Ok(csv) => csv,
        Err(e) => {
            tracing::error!(error = %e, "plan export failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "export failed");
        }
    };
    with_cache_control((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    ))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload)
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, String> {
    let mut plan = Plan::default();

    if let Some(v) = payload.total_capital {
        plan.total_capital = v;
    }
    if let Some(v) = payload.buckets {
        plan.buckets = v;
    }
    if let Some(v) = payload.withdrawal_plan {
        plan.withdrawal_plan = v;
    }
    if let Some(v) = payload.annual_withdrawal {
        plan.withdrawal_plan.annual_amount = v;
    }
    if let Some(v) = payload.adjust_for_inflation {
        plan.withdrawal_plan.adjust_for_inflation = v;
    }
    if let Some(v) = payload.inflation_rate {
        plan.withdrawal_plan.inflation_rate = v;
    }
    if let Some(v) = payload.time_frame {
        plan.time_frame = v;
    }

    let years = payload.years.unwrap_or(DEFAULT_PROJECTION_YEARS);
    let currency = match payload.currency.as_deref() {
        Some(code) => find_currency(code).ok_or_else(|| format!("unknown currency `{code}`"))?,
        None => default_currency(),
    };

    validate_plan(&mut plan, years)?;
    Ok(PlanRequest {
        plan,
        years,
        currency,
    })
}

fn validate_plan(plan: &mut Plan, years: u32) -> Result<(), String> {
    if !plan.total_capital.is_finite() || plan.total_capital < 0.0 {
        return Err("totalCapital must be >= 0".to_string());
    }

    let withdrawal = &plan.withdrawal_plan;
    if !withdrawal.annual_amount.is_finite() || withdrawal.annual_amount < 0.0 {
        return Err("annualWithdrawal must be >= 0".to_string());
    }
    if !(0.0..=MAX_INFLATION_RATE).contains(&withdrawal.inflation_rate) {
        return Err(format!(
            "inflationRate must be between 0 and {MAX_INFLATION_RATE}"
        ));
    }

    if !(1..=MAX_PROJECTION_YEARS).contains(&years) {
        return Err(format!("years must be between 1 and {MAX_PROJECTION_YEARS}"));
    }

    if plan.buckets.is_empty() {
        return Err("at least one bucket is required".to_string());
    }

    for (idx, bucket) in plan.buckets.iter_mut().enumerate() {
        if bucket.id.trim().is_empty() {
            return Err(format!("buckets[{idx}].id must not be empty"));
        }
        if bucket.time_horizon == 0 {
            return Err(format!("buckets[{idx}].timeHorizon must be >= 1"));
        }
        if !(0.0..=100.0).contains(&bucket.percentage) {
            return Err(format!("buckets[{idx}].percentage must be between 0 and 100"));
        }

        for allocation in &bucket.allocation {
            if !(0.0..=100.0).contains(&allocation.percentage) {
                return Err(format!(
                    "buckets[{idx}] allocation for `{}` must be between 0 and 100",
                    allocation.asset_id
                ));
            }
        }
        for (pos, allocation) in bucket.allocation.iter().enumerate() {
            if bucket.allocation[..pos]
                .iter()
                .any(|a| a.asset_id == allocation.asset_id)
            {
                return Err(format!(
                    "buckets[{idx}] allocates `{}` more than once",
                    allocation.asset_id
                ));
            }
        }

        bucket.allocation.retain(|a| a.percentage > 0.0);
    }

    for (idx, bucket) in plan.buckets.iter().enumerate() {
        if plan.buckets[..idx].iter().any(|b| b.id == bucket.id) {
            return Err(format!("duplicate bucket id `{}`", bucket.id));
        }
    }

    Ok(())
}
