pub mod dashboard_service;
pub mod dimension_parser;
pub mod geocoder;
pub mod lead_normalizer;
pub mod lead_service;
pub mod proximity;
