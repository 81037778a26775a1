// src/services/dashboard_service.rs

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    models::{
        dashboard::{DashboardMetrics, MonthlyTrendEntry, SourceDistributionEntry},
        lead::{Lead, LeadChannel, LeadStatus},
    },
    services::lead_service::LeadService,
};

const TREND_MONTHS: i32 = 6;
const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Clone)]
pub struct DashboardService {
    lead_service: LeadService,
}

impl DashboardService {
    pub fn new(lead_service: LeadService) -> Self {
        Self { lead_service }
    }

    pub async fn get_metrics(&self) -> DashboardMetrics {
        let leads = self.lead_service.leads().await;
        compute_metrics(&leads, Utc::now().date_naive())
    }
}

pub fn compute_metrics(leads: &[Lead], today: NaiveDate) -> DashboardMetrics {
    let total_leads = leads.len();
    let converted_leads = leads.iter().filter(|l| l.status == LeadStatus::Completed).count();

    let (conversion_rate, average_budget) = if total_leads == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let total = Decimal::from(total_leads as u64);
        (
            (Decimal::from(converted_leads as u64) * Decimal::ONE_HUNDRED / total).round_dp(1),
            average_budget_of(leads, total).round_dp(2),
        )
    };

    DashboardMetrics {
        total_leads,
        converted_leads,
        conversion_rate,
        average_budget,
        monthly_trend: monthly_trend(leads, today),
        source_distribution: source_distribution(leads),
    }
}

// A planilha não limita o orçamento: se a soma estourar o Decimal,
// divide antes de somar
fn average_budget_of(leads: &[Lead], total: Decimal) -> Decimal {
    let sum = leads
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.estimated_budget));

    match sum {
        Some(sum) => sum / total,
        None => leads
            .iter()
            .fold(Decimal::ZERO, |acc, l| acc.saturating_add(l.estimated_budget / total)),
    }
}

// Índice absoluto de mês (ano * 12 + mês0), para andar para trás sem dor
fn month_index(date: impl Datelike) -> i32 {
    date.year() * 12 + date.month0() as i32
}

// Últimos 6 meses até o mês de `today`, inclusive; meses vazios aparecem zerados
fn monthly_trend(leads: &[Lead], today: NaiveDate) -> Vec<MonthlyTrendEntry> {
    let current = month_index(today);
    let first = current - (TREND_MONTHS - 1);

    let mut buckets: HashMap<i32, (usize, usize)> = HashMap::new();
    for lead in leads {
        let idx = month_index(lead.created_at);
        if !(first..=current).contains(&idx) {
            continue;
        }
        let entry = buckets.entry(idx).or_default();
        entry.0 += 1;
        if lead.status == LeadStatus::Completed {
            entry.1 += 1;
        }
    }

    (first..=current)
        .map(|idx| {
            let (leads, conversions) = buckets.get(&idx).copied().unwrap_or_default();
            let month0 = idx.rem_euclid(12) as usize;
            MonthlyTrendEntry {
                month: format!("{:04}-{:02}", idx.div_euclid(12), month0 + 1),
                label: MONTH_LABELS[month0].to_string(),
                leads,
                conversions,
            }
        })
        .collect()
}

fn source_distribution(leads: &[Lead]) -> Vec<SourceDistributionEntry> {
    let mut counts: HashMap<LeadChannel, usize> = HashMap::new();
    for lead in leads {
        *counts.entry(lead.source).or_default() += 1;
    }

    let mut entries: Vec<SourceDistributionEntry> = counts
        .into_iter()
        .map(|(channel, count)| SourceDistributionEntry {
            source: channel.label().to_string(),
            count,
        })
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));
    entries
}
