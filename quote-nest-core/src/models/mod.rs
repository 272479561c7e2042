mod filter;
mod quote;

pub use filter::QuoteFilter;
pub use quote::{Quote, QuoteError, QuoteId, QuoteWire};
