pub mod parameters;
pub mod results;
