// src/services/proximity.rs

use crate::models::lead::{Coordinates, Lead};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 2.0;

// Distância de grande círculo (haversine), em km
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    // Arredondamento pode passar de 1 em pontos antípodas
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Leads a até `max_distance_km` (inclusive) do alvo, excluindo o próprio alvo.
/// Mantém a ordem de `all`.
pub fn nearby_leads(target: &Lead, all: &[Lead], max_distance_km: f64) -> Vec<Lead> {
    all.iter()
        .filter(|lead| lead.id != target.id)
        .filter(|lead| haversine_km(target.coordinates, lead.coordinates) <= max_distance_km)
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::lead::{
        LeadChannel, LeadDataQuality, LeadStatus, ParcelDimensions, PoolDimensions,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    pub(crate) fn lead_at(id: &str, lat: f64, lng: f64) -> Lead {
        Lead {
            id: id.to_string(),
            name: format!("Lead {}", id),
            email: None,
            phone: None,
            address: String::new(),
            pool_dimensions: PoolDimensions::default(),
            parcel_dimensions: ParcelDimensions::default(),
            access_rating: None,
            material: String::new(),
            estimated_budget: Decimal::ZERO,
            roi: None,
            status: LeadStatus::NewLead,
            source: LeadChannel::Unknown,
            conversation_summary: None,
            coordinates: Coordinates::new(lat, lng),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            last_contact: None,
            quality: LeadDataQuality::default(),
        }
    }

    const SOL: Coordinates = Coordinates::new(40.4168, -3.7038);
    const POZUELO: Coordinates = Coordinates::new(40.4357, -3.8136);
    const LAS_ROZAS: Coordinates = Coordinates::new(40.4927, -3.8742);

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(haversine_km(SOL, SOL), 0.0);
        assert_eq!(haversine_km(LAS_ROZAS, LAS_ROZAS), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        for (a, b) in [(SOL, POZUELO), (POZUELO, LAS_ROZAS), (SOL, Coordinates::new(-33.87, 151.21))] {
            assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn known_distance_madrid_pozuelo() {
        // ~9.5 km entre a Puerta del Sol e Pozuelo de Alarcón
        let d = haversine_km(SOL, POZUELO);
        assert!((9.0..10.0).contains(&d), "distância inesperada: {}", d);
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let d = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn nearby_excludes_target_and_far_leads() {
        let target = lead_at("a", SOL.lat, SOL.lng);
        let leads = vec![
            target.clone(),
            lead_at("b", 40.4200, -3.7000), // ~0.5 km
            lead_at("c", POZUELO.lat, POZUELO.lng),
            lead_at("d", 40.4170, -3.7040),
        ];

        let ids: Vec<String> = nearby_leads(&target, &leads, DEFAULT_NEARBY_RADIUS_KM)
            .into_iter()
            .map(|l| l.id)
            .collect();

        assert_eq!(ids, vec!["b", "d"]);
    }

    #[test]
    fn target_is_excluded_even_with_duplicate_coordinates() {
        let target = lead_at("a", SOL.lat, SOL.lng);
        let leads = vec![target.clone(), target.clone(), lead_at("twin", SOL.lat, SOL.lng)];

        let found = nearby_leads(&target, &leads, 0.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "twin");
    }

    #[test]
    fn boundary_distance_is_included() {
        let target = lead_at("a", SOL.lat, SOL.lng);
        let other = lead_at("b", POZUELO.lat, POZUELO.lng);
        let exact = haversine_km(SOL, POZUELO);

        let leads = vec![other];
        assert_eq!(nearby_leads(&target, &leads, exact).len(), 1);
        assert!(nearby_leads(&target, &leads, exact - 1e-6).is_empty());
    }
}
