pub mod config;
pub mod confirmation;
pub mod data_context;
pub mod export;
pub mod indicators;
pub mod models;
pub mod optimizer;
pub mod runner;
pub mod signals;
pub mod simulator;
