pub mod dashboard;
pub mod lead;
