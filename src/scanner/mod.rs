// Periodic wallet scanning
pub mod scheduler;

pub use scheduler::{ScanScheduleConfig, ScanScheduler};
