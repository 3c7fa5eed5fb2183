//! Sales transactions.
//!
//! This module contains:
//! - The `Transaction` record model and lazy date parsing
//! - Normalization of loosely-typed source rows into transactions

mod core;
mod normalize;

pub use core::{Transaction, parse_sale_date};
pub use normalize::{SourceRow, normalize_record};
