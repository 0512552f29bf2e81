//! Library exports for the SalesSync client, shared between the binary and tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod navigation;
pub mod pipeline;
pub mod services;
pub mod startup;
pub mod state;
pub mod storage;
pub mod tenant;
pub mod utils;
