pub mod catalog;
pub mod errors;
pub mod fetcher;
pub mod identity;
pub mod models;
pub mod normalizer;
pub mod progress;
pub mod property;
pub mod registry;
pub mod stats;
pub mod store;

pub use catalog::*;
pub use errors::*;
pub use fetcher::{fetch_all, FetchOptions, Fetched};
pub use identity::*;
pub use models::*;
pub use normalizer::{normalize, rules_for, Probe, RuleSet, Shape};
pub use progress::*;
pub use property::*;
pub use registry::*;
pub use stats::*;
pub use store::*;
