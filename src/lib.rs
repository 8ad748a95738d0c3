pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod models;
pub mod report;
pub mod validation;
