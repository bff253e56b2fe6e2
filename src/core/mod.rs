//! Core billing types, amount normalization and persistence validation.
//!
//! These are the records the ingestion pipeline produces: invoices with their
//! lines, trading partners, catalog products with supplier aliases, and
//! reusable discounts.

pub mod amounts;
mod builder;
mod error;
mod types;
mod validation;

pub use builder::*;
pub use error::*;
pub use types::*;
pub use validation::*;
