//! OpenAPI documentation, served through Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    auth_handler, image_handler, property_handler, review_handler, subscription_handler,
};
use crate::domain::{
    ListingStatus, Location, LocationInput, LocationPatch, NewPlan, OwnerSummary, Property,
    PropertyDetails, PropertyDraft, PropertyPatch, PropertyType, PropertyView, RatingSummary,
    Review, ReviewDraft, ReviewPatch, ReviewSort, ReviewView, ReviewerSummary, SubscriptionPlan,
    SubscriptionView, UserResponse, UserRole,
};
use crate::services::{LoginResponse, SavedLists, StoredImage, TokenResponse};
use crate::types::MessageResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Estate Market API",
        version = "0.1.0",
        description = "Property listings, reviews and agent subscriptions"
    ),
    servers((url = "http://localhost:3000", description = "Local development server")),
    paths(
        auth_handler::register,
        auth_handler::verify_email,
        auth_handler::login,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        auth_handler::me,
        property_handler::list_properties,
        property_handler::get_property,
        property_handler::create_property,
        property_handler::update_property,
        property_handler::delete_property,
        property_handler::my_properties,
        property_handler::favorites,
        property_handler::wishlist,
        property_handler::sync_saved,
        property_handler::toggle_favorite,
        property_handler::toggle_wishlist,
        review_handler::property_reviews,
        review_handler::create_review,
        review_handler::my_reviews,
        review_handler::update_review,
        review_handler::delete_review,
        review_handler::toggle_like,
        subscription_handler::list_plans,
        subscription_handler::create_plan,
        subscription_handler::subscribe,
        subscription_handler::my_subscription,
        image_handler::upload_images,
        image_handler::delete_image,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            OwnerSummary,
            Location,
            LocationInput,
            LocationPatch,
            PropertyType,
            ListingStatus,
            PropertyDetails,
            Property,
            PropertyView,
            PropertyDraft,
            PropertyPatch,
            Review,
            ReviewerSummary,
            ReviewView,
            ReviewDraft,
            ReviewPatch,
            ReviewSort,
            RatingSummary,
            SubscriptionPlan,
            SubscriptionView,
            NewPlan,
            SavedLists,
            StoredImage,
            MessageResponse,
            TokenResponse,
            LoginResponse,
            auth_handler::RegisterRequest,
            auth_handler::RegisterResponse,
            auth_handler::LoginRequest,
            auth_handler::ForgotPasswordRequest,
            auth_handler::ResetPasswordRequest,
            property_handler::FavoritesResponse,
            property_handler::WishlistResponse,
            review_handler::LikeResponse,
            subscription_handler::SubscribeRequest,
            image_handler::UploadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, verification and sign-in"),
        (name = "Properties", description = "Listing search and agent listing management"),
        (name = "Saved", description = "Favorites and wishlist"),
        (name = "Reviews", description = "Property reviews and likes"),
        (name = "Subscriptions", description = "Plans and agent subscriptions"),
        (name = "Images", description = "Standalone image upload")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/properties/{id}",
            "/api/reviews/{id}/like",
            "/api/subscriptions/subscribe",
            "/api/images/upload",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_image_upload_documents_multipart_body() {
        let doc = ApiDoc::openapi();
        let upload = doc
            .paths
            .paths
            .get("/api/images/upload")
            .and_then(|item| item.operations.get(&utoipa::openapi::PathItemType::Post))
            .expect("upload operation");
        let body = upload.request_body.as_ref().expect("request body");
        assert!(body.content.contains_key("multipart/form-data"));
    }
}
