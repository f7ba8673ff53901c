pub mod api;
pub mod catalog;
pub mod config;
pub mod data;
pub mod sql;
pub mod utils;
pub mod workbench;
