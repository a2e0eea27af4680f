//! Portfolio book-keeping
//!
//! [`PortfolioState`] is the snapshot every risk validator reads;
//! [`SharedPortfolio`] is the single mutex that serializes commits across
//! symbols.

mod shared;
mod types;

pub use shared::SharedPortfolio;
pub use types::{ClosedPosition, OpenPosition, PortfolioState};
