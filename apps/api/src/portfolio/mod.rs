//! Template selection and HTML rendering of portfolio pages.

pub mod handlers;
pub mod layout;
pub mod render;
pub mod selector;
pub mod service;
