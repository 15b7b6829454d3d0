use crate::core::forecast::ForecastService;
use crate::utils::error::{ForecastError, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub type Clock = fn() -> DateTime<Utc>;

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ForecastService>,
    pub clock: Clock,
}

impl ApiState {
    pub fn new(service: Arc<ForecastService>) -> Self {
        Self {
            service,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub date: Option<String>,
    #[serde(alias = "target_date")]
    pub target_date: Option<String>,
    pub lang: Option<String>,
    /// 目前不寄信，只接受欄位
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub daily_number: u32,
    pub forecast: ForecastBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForecastBody {
    pub title: String,
    pub content: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        if err.is_client_error() {
            return Self::bad_request(err.to_string());
        }
        tracing::error!(
            "Forecast request failed: {} (Category: {:?})",
            err,
            err.category()
        );
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

/// 請求本身不是合法 JSON、欄位型別錯誤或缺少 Content-Type
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body ({}): {}", rejection.status(), rejection.body_text());
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/make_forecast", post(make_forecast))
        .route("/api/health", get(health))
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn make_forecast(
    Extension(state): Extension<ApiState>,
    payload: std::result::Result<Json<ForecastRequest>, JsonRejection>,
) -> std::result::Result<Json<ForecastResponse>, ApiError> {
    let Json(req) = payload?;
    let date = req
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::bad_request("Date missing"))?;

    if req.email.is_some() {
        tracing::debug!("Ignoring email field; delivery is not handled by the API");
    }

    let now = (state.clock)();
    let result = state
        .service
        .daily_forecast(date, req.target_date.as_deref(), req.lang.as_deref(), now)
        .await?;

    let forecast = match result.forecast {
        Some(variant) => ForecastBody {
            title: variant.title,
            content: variant.content,
        },
        None => ForecastBody {
            title: format!("Dienas prognoze ({})", result.daily_number),
            content: "⚠️ Prognoze nav atrasta šim skaitlim.".to_string(),
        },
    };

    Ok(Json(ForecastResponse {
        daily_number: result.daily_number,
        forecast,
    }))
}

pub async fn health(Extension(state): Extension<ApiState>) -> Response {
    match state.service.store().ping().await {
        Ok(health) => (
            StatusCode::OK,
            Json(serde_json::json!({ "ok": true, "count": health.count })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Store ping failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// 綁定位址並執行到收到 Ctrl-C 為止
pub async fn serve(router: Router, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 HTTP server listening on {}", addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
