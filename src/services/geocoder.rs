// src/services/geocoder.rs

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{common::error::AppError, models::lead::Coordinates};

pub const MAPBOX_PLACES_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

// Mesmo conjunto do encodeURIComponent: `;` e `,` também são escapados
const QUERY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Resolve um endereço em texto livre para coordenadas.
///
/// `lookup` pode falhar; `geocode` nunca falha: erros são logados e viram `None`,
/// e quem chama decide a coordenada padrão.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, AppError>;

    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        // Sem endereço não há o que consultar
        if address.trim().is_empty() {
            return None;
        }

        match self.lookup(address).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Erro geocodificando endereço {:?}: {}", address, e);
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct MapboxGeocoder {
    client: Client,
    base_url: String,
    access_token: String,
    locality: String, // Ex: "Madrid, España"
    country: String,  // Ex: "ES"
}

impl MapboxGeocoder {
    pub fn new(
        client: Client,
        base_url: String,
        access_token: String,
        locality: String,
        country: String,
    ) -> Self {
        Self {
            client,
            base_url,
            access_token,
            locality,
            country,
        }
    }

    // Monta .../mapbox.places/{endereço, localidade}.json?access_token=..&country=..&types=address&limit=1
    fn request_url(&self, address: &str) -> Result<Url, AppError> {
        let query = format!("{}, {}", address.trim(), self.locality);

        let encoded = utf8_percent_encode(&query, QUERY_SEGMENT);

        let mut url = Url::parse(&format!("{}/{}.json", self.base_url.trim_end_matches('/'), encoded))
            .map_err(|e| AppError::Geocoding(format!("URL base inválida: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .append_pair("country", &self.country)
            .append_pair("types", "address")
            .append_pair("limit", "1");

        Ok(url)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, AppError> {
        // A URL carrega o token, então não vai para o log.
        let url = self.request_url(address)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AppError::Geocoding(format!("status {}", status)));
        }

        let body: GeocodingResponse = response.json().await?;
        Ok(body.first_coordinates())
    }
}

// Só o que usamos da resposta da Mapbox
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<GeocodingFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodingFeature {
    center: [f64; 2], // [lng, lat]
}

impl GeocodingResponse {
    fn first_coordinates(&self) -> Option<Coordinates> {
        self.features.first().map(|feature| {
            let [lng, lat] = feature.center;
            Coordinates::new(lat, lng)
        })
    }
}
