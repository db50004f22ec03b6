//! Command handlers

pub mod config;
pub mod model;
pub mod route;
