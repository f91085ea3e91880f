use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", timestamp: Utc::now().to_rfc3339() })
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use chrono::DateTime;

    use crate::health::health;

    #[tokio::test]
    async fn health_reports_healthy_with_timestamp() {
        let Json(payload) = health().await;

        assert_eq!(payload.status, "healthy");
        assert!(DateTime::parse_from_rfc3339(&payload.timestamp).is_ok());
    }
}
