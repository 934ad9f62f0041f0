//! Registration, login and profile maintenance.

pub mod handlers;
pub mod service;
