// src/models/lead.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    NewLead,
    InProgress,
    Negotiation,
    Completed,
}

impl LeadStatus {
    // Aceita "in_progress", "In Progress", "in-progress"...
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "new_lead" => Some(LeadStatus::NewLead),
            "in_progress" => Some(LeadStatus::InProgress),
            "negotiation" => Some(LeadStatus::Negotiation),
            "completed" => Some(LeadStatus::Completed),
            _ => None,
        }
    }
}

// Canal por onde o lead chegou
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadChannel {
    Tiktok,
    Whatsapp,
    Instagram,
    Phone,
    #[default]
    Unknown,
}

impl LeadChannel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "tiktok" => LeadChannel::Tiktok,
            "whatsapp" => LeadChannel::Whatsapp,
            "instagram" => LeadChannel::Instagram,
            "phone" | "telefono" | "teléfono" | "llamada" | "llamadas" => LeadChannel::Phone,
            _ => LeadChannel::Unknown,
        }
    }

    // Rótulo exibido nos gráficos do dashboard
    pub fn label(&self) -> &'static str {
        match self {
            LeadChannel::Tiktok => "TikTok",
            LeadChannel::Whatsapp => "WhatsApp",
            LeadChannel::Instagram => "Instagram",
            LeadChannel::Phone => "Llamadas",
            LeadChannel::Unknown => "Desconocido",
        }
    }
}

// --- VALORES ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// Medidas continuam como texto: a planilha não garante números.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PoolDimensions {
    #[schema(example = "3")]
    pub length: String,
    #[schema(example = "7")]
    pub width: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "1.8")]
    pub depth: Option<String>,
}

impl Default for PoolDimensions {
    fn default() -> Self {
        Self {
            length: "0".to_string(),
            width: "0".to_string(),
            depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParcelDimensions {
    #[schema(example = "400")]
    pub area: String,
}

impl Default for ParcelDimensions {
    fn default() -> Self {
        Self { area: "0".to_string() }
    }
}

// Quais partes do lead foram preenchidas com valores padrão.
// Coordenadas padrão NÃO são uma localização real.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadDataQuality {
    pub pool_dimensions_defaulted: bool,
    pub parcel_dimensions_defaulted: bool,
    pub coordinates_defaulted: bool,
}

// --- LEAD (O Dado) ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[schema(example = "recA1b2C3d4E5f6G7")]
    pub id: String,

    #[schema(example = "Juan Pérez")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    #[schema(example = "Calle de Alcalá 123")]
    pub address: String,

    pub pool_dimensions: PoolDimensions,
    pub parcel_dimensions: ParcelDimensions,

    // 1 a 5
    pub access_rating: Option<u8>,

    #[schema(example = "gresite")]
    pub material: String,

    #[schema(value_type = f64, example = 25000)]
    pub estimated_budget: Decimal,

    // Percentual
    pub roi: Option<f64>,

    pub status: LeadStatus,
    pub source: LeadChannel,
    pub conversation_summary: Option<String>,

    pub coordinates: Coordinates,

    pub created_at: DateTime<Utc>,
    pub last_contact: Option<DateTime<Utc>>,

    pub quality: LeadDataQuality,
}

// O que a camada de apresentação recebe: leads, carregando, erro.
// Em caso de erro na leitura não há resultado parcial: `leads` vem vazio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadsSnapshot {
    pub loading: bool,
    pub error: Option<String>,
    pub leads: Vec<Lead>,
    pub fetched_at: Option<DateTime<Utc>>,
}

// --- REGISTRO CRU (como vem da tabela) ---

// Os campos ficam sem tipo até o normalizador decodificá-los.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLeadRecord {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub fields: Value,
}
