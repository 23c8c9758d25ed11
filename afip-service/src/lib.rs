//! afip-service: electronic invoice authorization against the AFIP web services.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
