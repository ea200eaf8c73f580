//! Command handlers

pub mod build;
pub mod lint;
pub mod transform;
