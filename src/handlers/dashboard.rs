// src/handlers/dashboard.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    config::AppState,
    // Importamos os models para referenciar no Swagger
    models::dashboard::DashboardMetrics,
};

// GET /api/dashboard/metrics
#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Indicadores calculados a partir dos leads carregados", body = DashboardMetrics)
    )
)]
pub async fn get_metrics(State(app_state): State<AppState>) -> impl IntoResponse {
    let metrics = app_state.dashboard_service.get_metrics().await;
    (StatusCode::OK, Json(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        dashboard_service::DashboardService,
        lead_service::tests::{raw, service_with, FakeSource},
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn metrics_reflect_loaded_leads() {
        let lead_service = service_with(Arc::new(FakeSource::new(vec![
            raw("rec1", "Calle de Alcalá 123", "completed"),
            raw("rec2", "Pozuelo de Alarcón", "negotiation"),
        ])));
        lead_service.refetch().await.unwrap();

        let state = AppState {
            dashboard_service: DashboardService::new(lead_service.clone()),
            lead_service,
        };

        let response = get_metrics(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["totalLeads"], 2);
        assert_eq!(body["convertedLeads"], 1);
        assert_eq!(body["conversionRate"], 50.0);
        assert_eq!(body["averageBudget"], 20000.0);
        assert_eq!(body["sourceDistribution"][0]["source"], "Instagram");
        assert_eq!(body["sourceDistribution"][0]["count"], 2);
        assert_eq!(body["monthlyTrend"].as_array().unwrap().len(), 6);
    }
}
