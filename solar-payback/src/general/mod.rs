pub mod csv_io;
pub mod electricity_demand;
pub mod finance;
pub mod production;
pub mod spot_price;
pub mod spreadsheet;

pub use finance::{LoanCost, amortize};
