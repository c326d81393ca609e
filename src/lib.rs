//! Client for the sign accessibility assessment wizard.
//!
//! Collects sign metadata, prepares a photo, has the assessment service
//! analyze it and lets a reviewer edit the result before submitting.

pub mod config;
pub mod domain;
pub mod error;
pub mod form;
pub mod logging;
pub mod photo;
pub mod review;
pub mod services;
pub mod wizard;

pub use error::{WizardError, WizardResult};
