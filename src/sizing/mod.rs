//! Position sizing
//!
//! Converts a risk budget into a whole-share quantity. Three interchangeable
//! sizers share one outer bound: the position value never exceeds
//! `max_position_percent` of capital, and the reported risk is the realized
//! risk after that cap.
//!
//! - [`FixedRiskSizer`]: fixed percent of capital at risk
//! - [`KellySizer`]: fractional Kelly from win statistics
//! - [`VolatilitySizer`]: risk budget spread over an ATR multiple

mod fixed_risk;
mod kelly;
mod registry;
mod traits;
mod types;
mod volatility;

pub use types::{SizerParams, SizingResult};

pub use traits::{capped_result, risk_per_share, BoxedPositionSizer, PositionSizer};

pub use registry::{SizerFactory, SizerRegistry};

pub use fixed_risk::{FixedRiskSizer, FIXED_RISK};
pub use kelly::{KellySizer, KELLY_CRITERION};
pub use volatility::{VolatilitySizer, VOLATILITY_ADJUSTED};
