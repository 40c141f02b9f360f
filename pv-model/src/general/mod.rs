pub mod monthly;
pub mod series;
