//! Types shared between the scormhub backend and its API consumers.

pub mod model;
pub mod requests;
