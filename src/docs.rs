// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::refetch_leads,
        handlers::leads::get_lead,
        handlers::leads::get_nearby_leads,

        // --- Dashboard ---
        handlers::dashboard::get_metrics,
    ),
    components(
        schemas(
            // --- LEADS ---
            models::lead::LeadStatus,
            models::lead::LeadChannel,
            models::lead::Coordinates,
            models::lead::PoolDimensions,
            models::lead::ParcelDimensions,
            models::lead::LeadDataQuality,
            models::lead::Lead,
            models::lead::LeadsSnapshot,

            // --- DASHBOARD ---
            models::dashboard::DashboardMetrics,
            models::dashboard::MonthlyTrendEntry,
            models::dashboard::SourceDistributionEntry,
        )
    ),
    tags(
        (name = "Leads", description = "Leads da piscina: leitura, refetch e vizinhança"),
        (name = "Dashboard", description = "Indicadores e Gráficos Gerenciais")
    )
)]
pub struct ApiDoc;
