// src/services/lead_normalizer.rs

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{
    models::lead::{Coordinates, Lead, LeadChannel, LeadDataQuality, LeadStatus, RawLeadRecord},
    services::{
        dimension_parser::{parse_parcel_dimensions, parse_pool_dimensions},
        geocoder::Geocoder,
    },
};

// =============================================================================
//  DECODIFICAÇÃO (o único lugar que conhece os nomes de campo da tabela)
// =============================================================================

/// Campos de um registro da tabela, já tipados.
///
/// Nenhum campo falha a decodificação: tipos inesperados viram `None`
/// e os padrões são aplicados em `build_lead`.
#[derive(Debug, Default, PartialEq, Deserialize)]
pub struct LeadFields {
    #[serde(rename = "Nombre_Completo", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Mail", default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(rename = "Numero_Telefono", default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(rename = "Ubicacion", default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(rename = "Dimension_Piscina", default, deserialize_with = "lenient_text")]
    pub pool_dimensions: Option<String>,
    #[serde(rename = "Dimension_Parcela", default, deserialize_with = "lenient_text")]
    pub parcel_dimensions: Option<String>,
    #[serde(rename = "Acceso_Parcela", default, deserialize_with = "lenient_number")]
    pub access_rating: Option<f64>,
    #[serde(rename = "Material", default, deserialize_with = "lenient_text")]
    pub material: Option<String>,
    #[serde(rename = "Presupuesto", default, deserialize_with = "lenient_decimal")]
    pub budget: Option<Decimal>,
    #[serde(rename = "ROI", default, deserialize_with = "lenient_number")]
    pub roi: Option<f64>,
    #[serde(rename = "Status", default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(rename = "Fuente", default, deserialize_with = "lenient_text")]
    pub source: Option<String>,
    #[serde(rename = "Resumen_Conversacion", default, deserialize_with = "lenient_text")]
    pub conversation_summary: Option<String>,
    #[serde(rename = "Created_At", default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(rename = "Ultimo_Contacto", default, deserialize_with = "lenient_text")]
    pub last_contact: Option<String>,
}

impl LeadFields {
    pub fn decode(record_id: &str, fields: &Value) -> Self {
        if !fields.is_object() {
            if !fields.is_null() {
                tracing::warn!("Registro {} com campos em formato inesperado", record_id);
            }
            return Self::default();
        }

        LeadFields::deserialize(fields).unwrap_or_else(|e| {
            tracing::warn!("Registro {} não pôde ser decodificado: {}", record_id, e);
            Self::default()
        })
    }
}

// Texto: strings não vazias, números e booleanos viram texto; listas são unidas.
fn text_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(text_from_value).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        Value::String(s) => Decimal::from_str(s.trim().trim_end_matches('€').trim()).ok(),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(text_from_value))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(number_from_value))
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(decimal_from_value))
}

// Aceita RFC 3339 ("2024-05-01T10:00:00.000Z"), "2024-05-01" e "01/05/2024"
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// =============================================================================
//  MONTAGEM DO LEAD
// =============================================================================

pub fn build_lead(
    id: String,
    created_time: DateTime<Utc>,
    fields: LeadFields,
    geocoded: Option<Coordinates>,
    fallback: Coordinates,
) -> Lead {
    let pool = parse_pool_dimensions(fields.pool_dimensions.as_deref().unwrap_or_default());
    let parcel = parse_parcel_dimensions(fields.parcel_dimensions.as_deref().unwrap_or_default());

    let status = match fields.status.as_deref() {
        None => LeadStatus::NewLead,
        Some(raw) => LeadStatus::parse(raw).unwrap_or_else(|| {
            tracing::warn!("Lead {}: status desconhecido {:?}, usando new_lead", id, raw);
            LeadStatus::NewLead
        }),
    };

    // Número ou zero; orçamento negativo também vira zero
    let estimated_budget = fields
        .budget
        .filter(|b| !b.is_sign_negative())
        .unwrap_or(Decimal::ZERO);

    let access_rating = fields
        .access_rating
        .map(f64::round)
        .filter(|r| (1.0..=5.0).contains(r))
        .map(|r| r as u8);

    let created_at = fields
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(created_time);

    let quality = LeadDataQuality {
        pool_dimensions_defaulted: pool.is_defaulted(),
        parcel_dimensions_defaulted: parcel.is_defaulted(),
        coordinates_defaulted: geocoded.is_none(),
    };

    Lead {
        name: fields.name.unwrap_or_default(),
        email: fields.email,
        phone: fields.phone,
        address: fields.address.unwrap_or_default(),
        pool_dimensions: pool.into_value(),
        parcel_dimensions: parcel.into_value(),
        access_rating,
        material: fields.material.unwrap_or_default(),
        estimated_budget,
        roi: fields.roi,
        status,
        source: fields.source.as_deref().map(LeadChannel::parse).unwrap_or_default(),
        conversation_summary: fields.conversation_summary,
        coordinates: geocoded.unwrap_or(fallback),
        created_at,
        last_contact: fields.last_contact.as_deref().and_then(parse_timestamp),
        quality,
        id,
    }
}

// =============================================================================
//  NORMALIZAÇÃO EM PARALELO
// =============================================================================

/// Normaliza todos os registros, geocodificando em paralelo.
///
/// Espera todas as geocodificações terminarem; cada falha afeta só o seu
/// registro (que fica com `fallback`). A saída preserva a ordem da entrada.
pub async fn normalize(
    records: Vec<RawLeadRecord>,
    geocoder: &dyn Geocoder,
    fallback: Coordinates,
) -> Vec<Lead> {
    let leads = join_all(
        records
            .into_iter()
            .map(|record| normalize_record(record, geocoder, fallback)),
    )
    .await;

    let defaulted = leads.iter().filter(|l| l.quality.coordinates_defaulted).count();
    if defaulted > 0 {
        tracing::info!("{} de {} leads ficaram com coordenadas padrão", defaulted, leads.len());
    }

    leads
}

async fn normalize_record(
    record: RawLeadRecord,
    geocoder: &dyn Geocoder,
    fallback: Coordinates,
) -> Lead {
    let fields = LeadFields::decode(&record.id, &record.fields);
    let geocoded = match fields.address.as_deref() {
        Some(address) => geocoder.geocode(address).await,
        None => None,
    };

    build_lead(record.id, record.created_time, fields, geocoded, fallback)
}
