//! Domain types for tickmerge

pub mod quote;
pub mod session;
pub mod time_key;

pub use quote::{FileIndex, QuoteRecord};
pub use session::{SessionError, SessionWindow};
pub use time_key::TimeKey;
