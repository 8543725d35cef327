pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod session;
pub mod views;
