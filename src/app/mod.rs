pub mod config;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod models;
pub mod runner;
pub mod simpleperf;
