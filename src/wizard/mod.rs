//! Three-step wizard: metadata, photo, review.

pub mod controller;
pub mod state;

pub use controller::WizardController;
pub use state::{StepIndicator, StepStatus, Ticket, TicketKind, View, ViewChange, WizardState};
