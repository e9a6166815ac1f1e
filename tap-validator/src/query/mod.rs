//! ADQL query construction and catalog-driven query generation.

mod builder;
mod generator;
mod keywords;

pub use builder::{QueryBuilder, TAP_SCHEMA};
pub use generator::QueryGenerator;
pub use keywords::{escape_identifier, is_reserved};
