pub mod engine;
pub mod issuance;
pub mod pricing;

pub use engine::{base_rate, load_multiplier, CreditEngine, CreditError};
pub use issuance::{Allocation, IssuanceEngine};
pub use pricing::price_per_unit;
