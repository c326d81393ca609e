//! Metadata form built from the schema.

pub mod builder;
pub mod controls;
pub mod dependent;

pub use builder::{build_form, FormField, MetadataForm, OTHER_CHOICE, OTHER_SUFFIX};
pub use controls::{AutoDisplay, Control, InputControl, InputType, SelectControl, SelectOption};
pub use dependent::populate_dependent_select;
