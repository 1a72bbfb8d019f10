//! Database access for fact import
//!
//! One module per table. Functions that take part in a per-row transaction
//! are generic over the sqlx executor so they run against a pool or a
//! transaction alike.

pub mod audits;
pub mod fact_names;
pub mod fact_values;
pub mod hosts;
