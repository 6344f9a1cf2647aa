pub mod app_config;
pub mod catalog_cmd;
pub mod cli;
pub mod estimate;
pub mod history;
pub mod report;
pub mod shell;
