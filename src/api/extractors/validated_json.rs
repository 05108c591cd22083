//! Validated JSON extractor - Combines deserialization with validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::errors::AppError;

/// JSON body that has already passed its `validator` rules.
///
/// ```rust,ignore
/// async fn create_plan(ValidatedJson(plan): ValidatedJson<NewPlan>) { /* plan is valid */ }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(format_validation_errors(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// Flatten validation errors, nested ones included, into one message.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.sort();
    messages.join(", ")
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => out.extend(errs.iter().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })),
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ListingStatus, LocationInput, PropertyDraft, PropertyType};

    #[test]
    fn test_nested_messages_are_reported() {
        let draft = PropertyDraft {
            title: String::new(),
            description: "Garden".into(),
            price: 10.0,
            bedrooms: 1,
            bathrooms: 1,
            area: 20.0,
            property_type: PropertyType::House,
            status: ListingStatus::ForSale,
            details: Default::default(),
            amenities: vec![],
            location: LocationInput::default(),
        };
        let errors = draft.validate().unwrap_err();
        let message = format_validation_errors(&errors);
        assert!(message.contains("Title must be between 1 and 200 characters"));
        assert!(message.contains("City is required"));
    }
}
