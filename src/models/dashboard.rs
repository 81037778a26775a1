// src/models/dashboard.rs

use serde::Serialize;
use rust_decimal::Decimal;
use utoipa::ToSchema;

// Calculado a partir dos leads em memória; nunca é persistido.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_leads: usize,
    pub converted_leads: usize,  // Status "completed"
    #[schema(value_type = f64, example = 61.4)]
    pub conversion_rate: Decimal, // Percentual, 0 quando não há leads
    #[schema(value_type = f64, example = 28500)]
    pub average_budget: Decimal,
    pub monthly_trend: Vec<MonthlyTrendEntry>,
    pub source_distribution: Vec<SourceDistributionEntry>,
}

// 1. Tendência mensal (últimos 6 meses)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrendEntry {
    #[schema(example = "2024-05")]
    pub month: String,
    #[schema(example = "May")]
    pub label: String,
    pub leads: usize,
    pub conversions: usize,
}

// 2. Distribuição por canal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceDistributionEntry {
    #[schema(example = "WhatsApp")]
    pub source: String,
    pub count: usize,
}
