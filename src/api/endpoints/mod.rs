pub mod admin;
pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod finance;
pub mod inventory;
pub mod notifications;
pub mod patients;
pub mod samples;
pub mod settings;
pub mod staff;
pub mod suppliers;
pub mod tests;
