pub mod adapters;
pub mod catalog;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod keyring;
pub mod message;
pub mod providers;
pub mod store;
