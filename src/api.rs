use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::PredictorError;
use crate::service::{PredictionService, WeatherInput, WeatherPrediction};

pub type AppState = Arc<PredictionService>;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResponse {
    pub message: String,
    pub accuracy: f64,
}

/// `{"detail": ...}` error body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn from_anyhow(context: &str, err: &anyhow::Error) -> Self {
        let status = match err.downcast_ref::<PredictorError>() {
            Some(PredictorError::Validation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("{context}: {err:#}");
        }
        Self {
            status,
            detail: format!("{context}: {err}"),
        }
    }
}

impl ApiError {
    /// Malformed or incomplete request bodies keep the `detail` shape
    fn from_rejection(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: format!("Prediction error: {}", rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/train", get(train))
        .with_state(service)
}

async fn root() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "Weather Prediction API is running".to_string(),
    })
}

async fn predict(
    State(service): State<AppState>,
    payload: Result<Json<WeatherInput>, JsonRejection>,
) -> Result<Json<WeatherPrediction>, ApiError> {
    let Json(input) = payload.map_err(ApiError::from_rejection)?;
    service
        .predict(input)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_anyhow("Prediction error", &e))
}

async fn train(State(service): State<AppState>) -> Result<Json<TrainResponse>, ApiError> {
    let accuracy = service
        .retrain()
        .await
        .map_err(|e| ApiError::from_anyhow("Training error", &e))?;
    Ok(Json(TrainResponse {
        message: "Model successfully trained".to_string(),
        accuracy,
    }))
}
