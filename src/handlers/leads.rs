// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    config::AppState,
    models::lead::{Lead, LeadsSnapshot},
    services::proximity::DEFAULT_NEARBY_RADIUS_KM,
};

// =============================================================================
//  ÁREA 1: LISTAGEM E REFETCH
// =============================================================================

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    responses(
        (status = 200, description = "Leads atuais, estado de carregamento e último erro", body = LeadsSnapshot)
    )
)]
pub async fn list_leads(State(app_state): State<AppState>) -> impl IntoResponse {
    let snapshot = app_state.lead_service.snapshot().await;
    (StatusCode::OK, Json(snapshot))
}

// POST /api/leads/refetch
#[utoipa::path(
    post,
    path = "/api/leads/refetch",
    tag = "Leads",
    responses(
        (status = 200, description = "Pipeline executado de novo", body = LeadsSnapshot),
        (status = 502, description = "Falha na leitura da tabela de leads")
    )
)]
pub async fn refetch_leads(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let service = app_state.lead_service.clone();

    // Roda numa task própria: se o cliente desconectar, o refetch termina mesmo assim
    let snapshot = tokio::spawn(async move { service.refetch().await })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de refetch: {}", e))??;

    Ok((StatusCode::OK, Json(snapshot)))
}

// =============================================================================
//  ÁREA 2: CONSULTAS POR LEAD
// =============================================================================

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(
        ("id" = String, Path, description = "ID do registro no Airtable")
    ),
    responses(
        (status = 200, description = "Lead encontrado", body = Lead),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state.lead_service.find(&id).await?;
    Ok((StatusCode::OK, Json(lead)))
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct NearbyQuery {
    /// Raio em km (padrão: 2)
    #[validate(range(min = 0.0, max = 500.0, message = "O raio deve estar entre 0 e 500 km"))]
    #[param(example = 2.0)]
    pub radius_km: Option<f64>,
}

impl NearbyQuery {
    pub fn radius(&self) -> Result<f64, AppError> {
        self.validate()?;

        let radius = self.radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);

        // `range` deixa passar NaN
        if !radius.is_finite() {
            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("range");
            error.message = Some("O raio deve estar entre 0 e 500 km".into());
            errors.add("radius_km", error);
            return Err(AppError::ValidationError(errors));
        }

        Ok(radius)
    }
}

// GET /api/leads/{id}/nearby
#[utoipa::path(
    get,
    path = "/api/leads/{id}/nearby",
    tag = "Leads",
    params(
        ("id" = String, Path, description = "ID do lead de referência"),
        NearbyQuery
    ),
    responses(
        (status = 200, description = "Outros leads dentro do raio", body = Vec<Lead>),
        (status = 400, description = "Raio inválido"),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn get_nearby_leads(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<NearbyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let radius_km = query.radius()?;

    let leads = app_state.lead_service.nearby(&id, radius_km).await?;

    Ok((StatusCode::OK, Json(leads)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        dashboard_service::DashboardService,
        lead_service::tests::{raw, service_with, FakeSource},
    };
    use axum::response::Response;
    use serde_json::Value;
    use std::sync::{atomic::Ordering, Arc};

    fn state_with(source: Arc<FakeSource>) -> AppState {
        let lead_service = service_with(source);
        AppState {
            dashboard_service: DashboardService::new(lead_service.clone()),
            lead_service,
        }
    }

    fn sample_source() -> Arc<FakeSource> {
        Arc::new(FakeSource::new(vec![
            raw("rec1", "Calle de Alcalá 123", "completed"),
            raw("rec2", "Calle de Alcalá 130", "in_progress"),
            raw("rec3", "Pozuelo de Alarcón", ""),
        ]))
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn refetch_then_list_returns_leads() {
        let state = state_with(sample_source());

        let response = refetch_leads(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(list_leads(State(state)).await.into_response()).await;
        assert_eq!(body["loading"], false);
        assert_eq!(body["error"], Value::Null);
        assert_eq!(body["leads"].as_array().unwrap().len(), 3);
        assert_eq!(body["leads"][0]["status"], "completed");
        assert_eq!(body["leads"][2]["status"], "new_lead");
        assert_eq!(body["leads"][0]["poolDimensions"]["length"], "8");
    }

    #[tokio::test]
    async fn failed_refetch_answers_bad_gateway_and_keeps_error_state() {
        let source = sample_source();
        source.failing.store(true, Ordering::SeqCst);
        let state = state_with(source);

        let response = refetch_leads(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = json_body(list_leads(State(state)).await.into_response()).await;
        assert!(body["error"].as_str().unwrap().contains("503"));
        assert!(body["leads"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_lead_is_not_found() {
        let state = state_with(sample_source());
        state.lead_service.refetch().await.unwrap();

        let response = get_lead(State(state), Path("nope".to_string())).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn nearby_uses_default_radius() {
        let state = state_with(sample_source());
        state.lead_service.refetch().await.unwrap();

        let response = get_nearby_leads(
            State(state),
            Path("rec1".to_string()),
            Query(NearbyQuery::default()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let ids: Vec<&str> = body.as_array().unwrap().iter().map(|l| l["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["rec2"]);
    }

    #[tokio::test]
    async fn nearby_rejects_invalid_radius() {
        let state = state_with(sample_source());
        state.lead_service.refetch().await.unwrap();

        for radius in [-1.0, 1000.0, f64::NAN] {
            let response = get_nearby_leads(
                State(state.clone()),
                Path("rec1".to_string()),
                Query(NearbyQuery { radius_km: Some(radius) }),
            )
            .await
            .into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let body = json_body(response).await;
            assert_eq!(body["details"]["radius_km"][0], "O raio deve estar entre 0 e 500 km");
        }
    }
}
