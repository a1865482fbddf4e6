pub mod assignment;
pub mod asset;
pub mod client;
pub mod launch;
pub mod learner;
