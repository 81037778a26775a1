pub mod lead_repo;
pub use lead_repo::{AirtableLeadRepository, LeadSource};
