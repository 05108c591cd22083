//! Custom request extractors.

mod listing_form;
mod validated_json;

pub use listing_form::{ImageFiles, ListingForm};
pub use validated_json::{format_validation_errors, ValidatedJson};
