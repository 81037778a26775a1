// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    db::{lead_repo::AIRTABLE_API_URL, AirtableLeadRepository},
    models::lead::Coordinates,
    services::{
        dashboard_service::DashboardService,
        geocoder::{MapboxGeocoder, MAPBOX_PLACES_URL},
        lead_service::LeadService,
    },
};

// Centro de Madrid
pub const DEFAULT_FALLBACK: Coordinates = Coordinates::new(40.4168, -3.7038);

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub airtable_api_url: String,
    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub airtable_table: String,
    pub airtable_view: String,
    pub mapbox_api_url: String,
    pub mapbox_token: String,
    pub geocoder_locality: String,
    pub geocoder_country: String,
    pub fallback: Coordinates,
    pub http_timeout: Duration,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separado de `from_env` para poder testar sem mexer no ambiente do processo
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).with_context(|| format!("{} deve ser definida", key));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let number = |key: &str, default: f64| -> anyhow::Result<f64> {
            match get(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("{} não é um número válido: {:?}", key, raw)),
                None => Ok(default),
            }
        };

        let timeout_secs = number("HTTP_TIMEOUT_SECS", 10.0)?;
        if timeout_secs <= 0.0 || !timeout_secs.is_finite() {
            anyhow::bail!("HTTP_TIMEOUT_SECS deve ser positivo");
        }

        let fallback_lat = number("FALLBACK_LAT", DEFAULT_FALLBACK.lat)?;
        if !(-90.0..=90.0).contains(&fallback_lat) {
            anyhow::bail!("FALLBACK_LAT deve estar entre -90 e 90");
        }
        let fallback_lng = number("FALLBACK_LNG", DEFAULT_FALLBACK.lng)?;
        if !(-180.0..=180.0).contains(&fallback_lng) {
            anyhow::bail!("FALLBACK_LNG deve estar entre -180 e 180");
        }

        Ok(Self {
            airtable_api_url: or_default("AIRTABLE_API_URL", AIRTABLE_API_URL),
            airtable_api_key: required("AIRTABLE_API_KEY")?,
            airtable_base_id: required("AIRTABLE_BASE_ID")?,
            airtable_table: or_default("AIRTABLE_TABLE", "PiscinasLosHermanos"),
            airtable_view: or_default("AIRTABLE_VIEW", "Grid view"),
            mapbox_api_url: or_default("MAPBOX_API_URL", MAPBOX_PLACES_URL),
            mapbox_token: required("MAPBOX_TOKEN")?,
            geocoder_locality: or_default("GEOCODER_LOCALITY", "Madrid, España"),
            geocoder_country: or_default("GEOCODER_COUNTRY", "ES"),
            fallback: Coordinates::new(fallback_lat, fallback_lng),
            http_timeout: Duration::from_secs_f64(timeout_secs),
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:3000"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub lead_service: LeadService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        // Um único cliente HTTP compartilhado entre Airtable e Mapbox
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("Falha ao criar o cliente HTTP")?;

        // --- Monta o gráfico de dependências ---
        let lead_repo = AirtableLeadRepository::new(
            http_client.clone(),
            config.airtable_api_url.clone(),
            config.airtable_api_key.clone(),
            config.airtable_base_id.clone(),
            config.airtable_table.clone(),
            config.airtable_view.clone(),
        );
        let geocoder = MapboxGeocoder::new(
            http_client,
            config.mapbox_api_url.clone(),
            config.mapbox_token.clone(),
            config.geocoder_locality.clone(),
            config.geocoder_country.clone(),
        );

        let lead_service = LeadService::new(Arc::new(lead_repo), Arc::new(geocoder), config.fallback);
        let dashboard_service = DashboardService::new(lead_service.clone());

        tracing::info!(
            "✅ Estado montado (tabela: {}, localidade: {})",
            config.airtable_table,
            config.geocoder_locality
        );

        Ok(Self {
            lead_service,
            dashboard_service,
        })
    }
}
