//! Core settlement logic, independent of the command-line surface.

/// Aggregation engine: daily records -> per-driver summaries
pub mod aggregation;
/// Settlement PDF rendering
pub mod export;
/// Composite document keys
pub mod keys;
/// Deductions and final pay
pub mod payout;
/// Route/operator unit-price lookups
pub mod rates;
/// Daily record entry
pub mod record;
/// Route registration
pub mod route;
/// Explicit acting-user context
pub mod session;
/// Final payout persistence
pub mod settlement;
/// User registration
pub mod user;

pub use aggregation::{DriverSummary, Period, RouteDetail, Summaries, aggregate, aggregate_driver};
pub use payout::{Deductions, Settlement, compute_final_pay};
pub use rates::{RateResolver, UnitPrices, resolve_rate};
pub use session::Session;
