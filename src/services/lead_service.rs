// src/services/lead_service.rs

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::LeadSource,
    models::lead::{Coordinates, Lead, LeadsSnapshot},
    services::{geocoder::Geocoder, lead_normalizer::normalize, proximity::nearby_leads},
};

// Estado em memória; recriado por inteiro a cada refetch
#[derive(Debug, Default)]
struct LeadsState {
    leads: Vec<Lead>,
    error: Option<String>,
    fetched_at: Option<DateTime<Utc>>,
    applied_generation: u64,
}

impl LeadsState {
    fn to_snapshot(&self, in_flight: usize) -> LeadsSnapshot {
        // Antes da primeira leitura terminar, conta como carregando
        let never_loaded = self.fetched_at.is_none() && self.error.is_none();

        LeadsSnapshot {
            loading: in_flight > 0 || never_loaded,
            error: self.error.clone(),
            leads: self.leads.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

// Conta um refetch em andamento enquanto viver; o Drop cobre o futuro cancelado
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct LeadService {
    source: Arc<dyn LeadSource>,
    geocoder: Arc<dyn Geocoder>,
    fallback: Coordinates,
    state: Arc<RwLock<LeadsState>>,
    generation: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
}

impl LeadService {
    pub fn new(source: Arc<dyn LeadSource>, geocoder: Arc<dyn Geocoder>, fallback: Coordinates) -> Self {
        Self {
            source,
            geocoder,
            fallback,
            state: Arc::new(RwLock::new(LeadsState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Roda o pipeline inteiro (leitura da tabela + normalização).
    ///
    /// Sem cancelamento nem retry. Se um refetch mais novo já foi aplicado,
    /// o resultado deste é descartado.
    pub async fn refetch(&self) -> Result<LeadsSnapshot, AppError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = InFlight::start(&self.in_flight);

        let result = self.load().await;

        let mut state = self.state.write().await;
        drop(in_flight);

        let superseded = generation < state.applied_generation;
        if superseded {
            tracing::debug!("Refetch #{} descartado: já existe um resultado mais novo", generation);
        }

        match result {
            Ok(leads) => {
                if !superseded {
                    tracing::info!("✅ Refetch #{}: {} leads carregados", generation, leads.len());
                    state.applied_generation = generation;
                    state.leads = leads;
                    state.error = None;
                    state.fetched_at = Some(Utc::now());
                }
                Ok(state.to_snapshot(self.in_flight.load(Ordering::SeqCst)))
            }
            Err(e) => {
                if !superseded {
                    tracing::error!("🔥 Refetch #{} falhou: {}", generation, e);
                    state.applied_generation = generation;
                    state.leads.clear();
                    state.error = Some(e.to_string());
                    state.fetched_at = Some(Utc::now());
                }
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<Vec<Lead>, AppError> {
        let records = self.source.fetch_all().await?;
        Ok(normalize(records, self.geocoder.as_ref(), self.fallback).await)
    }

    pub async fn snapshot(&self) -> LeadsSnapshot {
        let state = self.state.read().await;
        state.to_snapshot(self.in_flight.load(Ordering::SeqCst))
    }

    pub async fn leads(&self) -> Vec<Lead> {
        self.state.read().await.leads.clone()
    }

    pub async fn find(&self, id: &str) -> Result<Lead, AppError> {
        self.state
            .read()
            .await
            .leads
            .iter()
            .find(|lead| lead.id == id)
            .cloned()
            .ok_or_else(|| AppError::LeadNotFound(id.to_string()))
    }

    // getNearbyLeads(lead, radiusKm)
    pub async fn nearby(&self, id: &str, radius_km: f64) -> Result<Vec<Lead>, AppError> {
        let state = self.state.read().await;

        let target = state
            .leads
            .iter()
            .find(|lead| lead.id == id)
            .ok_or_else(|| AppError::LeadNotFound(id.to_string()))?;

        Ok(nearby_leads(target, &state.leads, radius_km))
    }
}
