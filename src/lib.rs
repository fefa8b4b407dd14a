pub mod config;
pub mod docgen;
pub mod inspect;
pub mod logging;
pub mod probe;
pub mod record;
pub mod status;
pub mod style;
pub mod writer;

pub use config::{ResultLayout, TargetConfig, UatConfig};
pub use status::{ResultSet, TestResult, TestStatus};
