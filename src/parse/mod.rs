//! Parsers voor de algoritmecatalogus en de beschrijvingsteksten.

pub mod catalogue;
pub mod description;

pub use catalogue::{LoadReport, load_catalogue, parse_catalogue};
