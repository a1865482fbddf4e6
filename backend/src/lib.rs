//! scormhub backend: distributes client-branded SCORM wrapper packages and
//! hands learners off to the CloudScorm LMS.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod lms;
pub mod packaging;
pub mod services;
pub mod state;
pub mod storage;
