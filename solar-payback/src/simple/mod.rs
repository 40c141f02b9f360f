pub mod config;
pub mod economics;
pub mod plot;
pub mod sweep;

pub use config::ScenarioConfig;
pub use economics::{project, validate_parameters};
pub use sweep::{
    HouseholdAdoption, ScenarioOutcome, YearInputs, evaluate_scenarios, run_scenario_sweep,
};
