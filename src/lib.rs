pub mod client;
pub mod date_range;
pub mod errors;
pub mod models;
pub mod monthly;
pub mod plants;
pub mod report;
pub mod settlement;
pub mod timekey;

pub use client::EpiasClient;
pub use errors::AnalyzerError;
pub use models::{HourlyRow, MonthlyExtras, MonthlyRow, MonthlySummary, PlantMeta, TimePoint};
pub use monthly::{build_monthly_summary, compute_monthly_extras};
pub use report::build_report;
pub use settlement::build_plant_table;
