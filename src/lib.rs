pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod observability;
pub mod pubsub;
pub mod state;
pub mod tracking;
