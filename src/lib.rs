pub mod apply;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod plan;
pub mod policy;
pub mod store;
