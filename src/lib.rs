pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod manager;
pub mod models;
pub mod scope;
pub mod store;
