// src/services/dimension_parser.rs

use crate::models::lead::{ParcelDimensions, PoolDimensions};

/// Resultado de um parse que nunca falha.
///
/// `Defaulted` carrega o valor substituído (total ou parcialmente), para que
/// quem consome saiba distinguir um "0" real de um "0" por entrada ruim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T> {
    Exact(T),
    Defaulted(T),
}

impl<T> Parsed<T> {
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Parsed::Defaulted(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Parsed::Exact(v) | Parsed::Defaulted(v) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Parsed::Exact(v) | Parsed::Defaulted(v) => v,
        }
    }
}

const SEPARATOR: char = 'x';

// Formato esperado: "3x7" (comprimento x largura), opcionalmente "3x7x1.5"
pub fn parse_pool_dimensions(raw: &str) -> Parsed<PoolDimensions> {
    let raw = raw.trim();

    if !raw.contains(SEPARATOR) {
        if !raw.is_empty() {
            tracing::debug!("Dimensão de piscina sem separador '{}': {:?}", SEPARATOR, raw);
        }
        return Parsed::Defaulted(PoolDimensions::default());
    }

    let mut tokens = raw
        .split(SEPARATOR)
        .map(str::trim)
        .map(|t| (!t.is_empty()).then_some(t));

    let length = tokens.next().flatten();
    let width = tokens.next().flatten();
    let depth = tokens.next().flatten().map(str::to_owned);

    let dimensions = PoolDimensions {
        length: length.unwrap_or("0").to_owned(),
        width: width.unwrap_or("0").to_owned(),
        depth,
    };

    if length.is_some() && width.is_some() {
        Parsed::Exact(dimensions)
    } else {
        Parsed::Defaulted(dimensions)
    }
}

// Formato esperado: "400" (a string inteira é a área)
pub fn parse_parcel_dimensions(raw: &str) -> Parsed<ParcelDimensions> {
    let area = raw.trim();

    if area.is_empty() {
        return Parsed::Defaulted(ParcelDimensions::default());
    }

    Parsed::Exact(ParcelDimensions { area: area.to_owned() })
}
