//! # Generators
//!
//! SQL template collaborators for the feed dispatcher.
//!
//! Each feed renders a BigQuery standard SQL query against the table named
//! for it in the [`contracts::WarehouseConfig`]. Inputs are embedded as
//! escaped string literals; they are not otherwise validated here.

mod literal;
pub mod templates;
mod warehouse;

pub use contracts::SqlGenerator;
pub use literal::string_literal;
pub use warehouse::{Today, WarehouseSqlGenerator};
