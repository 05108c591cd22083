//! Multipart listing form: an optional `data` JSON part plus `images` file parts.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::validated_json::format_validation_errors;
use crate::config::MAX_IMAGES_PER_REQUEST;
use crate::errors::AppError;

const DATA_FIELD: &str = "data";
const IMAGES_FIELD: &str = "images";

pub struct ListingForm<T> {
    /// Parsed and validated `data` part, if the client sent one
    pub data: Option<T>,
    /// Raw image files in upload order
    pub images: Vec<Bytes>,
}

impl<T> ListingForm<T> {
    pub fn require_data(self) -> Result<(T, Vec<Bytes>), AppError> {
        match self.data {
            Some(data) => Ok((data, self.images)),
            None => Err(AppError::bad_request("Property data is required")),
        }
    }
}

fn parse_data<T: DeserializeOwned + Validate>(raw: &[u8]) -> Result<T, AppError> {
    let value: T = serde_json::from_slice(raw)
        .map_err(|e| AppError::validation(format!("Invalid property data: {}", e)))?;
    value
        .validate()
        .map_err(|e| AppError::validation(format_validation_errors(&e)))?;
    Ok(value)
}

/// Raw `data` part and image files of a multipart body.
async fn read_parts<S: Send + Sync>(
    req: Request,
    state: &S,
) -> Result<(Option<Bytes>, Vec<Bytes>), AppError> {
    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?;

    let mut data = None;
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(DATA_FIELD) => {
                let raw = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                data = Some(raw);
            }
            Some(IMAGES_FIELD) => {
                if images.len() == MAX_IMAGES_PER_REQUEST {
                    return Err(AppError::bad_request(format!(
                        "At most {} images per request",
                        MAX_IMAGES_PER_REQUEST
                    )));
                }
                let raw = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                if !raw.is_empty() {
                    images.push(raw);
                }
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    Ok((data, images))
}

#[async_trait]
impl<S, T> FromRequest<S> for ListingForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (raw, images) = read_parts(req, state).await?;
        let data = raw.map(|raw| parse_data::<T>(&raw)).transpose()?;
        Ok(Self { data, images })
    }
}

/// Just the `images` parts of a multipart body.
pub struct ImageFiles(pub Vec<Bytes>);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for ImageFiles {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (_, images) = read_parts(req, state).await?;
        Ok(Self(images))
    }
}
