// 🌐 Statement API - Invocation interface over HTTP (axum)
//
//   GET /api/health
//   GET /api/statements/:customer?start_date=&end_date=         full statement
//   GET /api/statements/:customer/report?start_date=&end_date=  grid projection

use crate::db::SqliteLedger;
use crate::error::StatementError;
use crate::model::Statement;
use crate::report::ReportTable;
use crate::statement::{StatementEngine, StatementRequest};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    engine: Arc<StatementEngine>,
    /// Pinned "today" (tests); the local date is used when unset
    fixed_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(conn: Connection, engine: StatementEngine) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
            engine: Arc::new(engine),
            fixed_today: None,
        }
    }

    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn generate(&self, customer: String, range: RangeQuery) -> Result<Statement, StatementError> {
        let conn = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))?;

        let request = StatementRequest {
            customer,
            start_date: range.start_date,
            end_date: range.end_date,
        };
        self.engine.generate(&SqliteLedger::new(&conn), &request, self.today())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

#[derive(Serialize)]
struct ApiError {
    kind: &'static str,
    message: String,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl IntoResponse for StatementError {
    fn into_response(self) -> Response {
        let status = match &self {
            StatementError::InvalidDate { .. } | StatementError::InvalidRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            StatementError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
            StatementError::DataAccess(_) | StatementError::InvalidConfig(_) => {
                error!(error = %self, "statement generation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ApiError {
                kind: self.kind(),
                message: self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/statements/:customer - Full statement
async fn get_statement(
    State(state): State<AppState>,
    Path(customer): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<ApiResponse<Statement>>, StatementError> {
    let statement = state.generate(customer, range)?;
    Ok(Json(ApiResponse::ok(statement)))
}

/// GET /api/statements/:customer/report - Date/Description/Amount/Balance grid
async fn get_statement_report(
    State(state): State<AppState>,
    Path(customer): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<ApiResponse<ReportTable>>, StatementError> {
    let statement = state.generate(customer, range)?;
    let labels = &state.engine.config().column_labels;
    Ok(Json(ApiResponse::ok(statement.report_with(labels))))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/statements/:customer", get(get_statement))
        .route("/statements/:customer/report", get(get_statement_report))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
