pub mod abi;
pub mod address_book;
pub mod aggregator;
pub mod chain;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod format;
pub mod holders;
pub mod price;
pub mod telemetry;
pub mod tokens;
pub mod utils;
