/// Database connection and schema creation
pub mod database;

/// Settlement policy and export settings from `settlement.toml`
pub mod settings;

pub use settings::{ExportSettings, Settings, SettlementPolicy};
