//! Turns the parameters of a sales query into the predicate and ordering used
//! to answer it.

mod filter;
mod request;
mod search;
mod sort;

pub use filter::SalesFilter;
pub use request::SalesQuery;
pub use search::{SearchTerms, has_word_prefix};
pub use sort::{SalesSort, SortKey, SortOrder, compare_names};
