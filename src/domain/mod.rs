//! Domain models for the assessment service.

pub mod assessment;
pub mod schema;

pub use assessment::*;
pub use schema::*;
