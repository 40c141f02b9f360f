pub mod error;
pub mod general;
pub mod simple;

// Re-export commonly used items for convenience
pub use error::ProjectionError;
pub use general::finance::{LoanCost, amortize};
pub use simple::economics::project;
pub use simple::sweep::run_scenario_sweep;
