//! HTTP-level tests over the full router.
//!
//! The services behind the router are in-memory fakes, so these run without
//! Postgres, Redis or an object store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use estate_market::api::{create_router, AppState};
use estate_market::domain::{
    Actor, ListingStatus, NewPlan, Property, PropertyDetails, PropertyDraft, PropertyFilter,
    PropertyPatch, PropertyType, PropertyView, Review, ReviewDraft, ReviewPatch, ReviewSort,
    ReviewView, SavedList, SubscriptionPlan, SubscriptionView, User,
};
use estate_market::errors::{AppError, AppResult, QuotaError};
use estate_market::infra::DUPLICATE_REVIEW_MESSAGE;
use estate_market::services::{
    AuthService, Claims, ImageService, ListingService, LoginResponse, Registration,
    ReviewService, SavedLists, SavedService, ServiceContainer, StoredImage, SubscriptionService,
};
use estate_market::types::{Paginated, PaginationParams};

const AGENT_TOKEN: &str = "agent-token";
const USER_TOKEN: &str = "user-token";

fn unused<T>() -> AppResult<T> {
    Err(AppError::internal("not exercised by this test"))
}

// =============================================================================
// Fakes
// =============================================================================

/// Two fixed bearer tokens: one agent, one plain user.
struct FakeAuth {
    agent_id: Uuid,
    user_id: Uuid,
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        Ok(User {
            id: Uuid::new_v4(),
            name: registration.name,
            email: registration.email,
            phone_number: registration.phone_number,
            password_hash: "hashed".to_string(),
            role: registration.role,
            is_verified: false,
            verification: None,
            password_reset: None,
            favorites: vec![],
            wishlist: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    async fn verify_email(&self, _token: &str) -> AppResult<()> {
        unused()
    }

    async fn login(&self, _email: String, _password: String) -> AppResult<LoginResponse> {
        Err(AppError::InvalidCredentials)
    }

    async fn forgot_password(&self, _email: String) -> AppResult<()> {
        unused()
    }

    async fn reset_password(&self, _token: &str, _password: String) -> AppResult<()> {
        unused()
    }

    async fn me(&self, _user_id: Uuid) -> AppResult<User> {
        unused()
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let (sub, role) = match token {
            AGENT_TOKEN => (self.agent_id, "agent"),
            USER_TOKEN => (self.user_id, "user"),
            _ => return Err(AppError::Unauthorized),
        };
        Ok(Claims {
            sub,
            email: format!("{}@example.com", role),
            role: role.to_string(),
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        })
    }
}

/// One public listing; creating more is refused for lack of quota.
struct FakeListings {
    listing: PropertyView,
}

#[async_trait]
impl ListingService for FakeListings {
    async fn create(
        &self,
        _actor: Actor,
        _draft: PropertyDraft,
        _images: Vec<Bytes>,
    ) -> AppResult<PropertyView> {
        Err(QuotaError::QuotaExceeded.into())
    }

    async fn update(
        &self,
        _actor: Actor,
        _id: Uuid,
        _patch: PropertyPatch,
        _images: Vec<Bytes>,
    ) -> AppResult<PropertyView> {
        unused()
    }

    async fn delete(&self, _actor: Actor, _id: Uuid) -> AppResult<()> {
        unused()
    }

    async fn list(
        &self,
        filter: PropertyFilter,
        page: PaginationParams,
    ) -> AppResult<Paginated<PropertyView>> {
        let matches: Vec<PropertyView> = [self.listing.clone()]
            .into_iter()
            .filter(|v| filter.min_bedrooms.map_or(true, |min| v.property.bedrooms >= min))
            .collect();
        let total = matches.len() as u64;
        Ok(Paginated::new(matches, &page, total))
    }

    async fn get(&self, id: Uuid) -> AppResult<PropertyView> {
        if id == self.listing.property.id {
            Ok(self.listing.clone())
        } else {
            Err(AppError::not_found("Property"))
        }
    }

    async fn list_mine(
        &self,
        _owner_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<Paginated<PropertyView>> {
        Ok(Paginated::new(vec![], &page, 0))
    }
}

/// Reviews keyed by id, plus the (property, user) pairs already reviewed.
#[derive(Default)]
struct FakeReviews {
    reviews: Mutex<Vec<Review>>,
    reviewed: Mutex<HashSet<(Uuid, Uuid)>>,
}

#[async_trait]
impl ReviewService for FakeReviews {
    async fn create(
        &self,
        user_id: Uuid,
        property_id: Uuid,
        draft: ReviewDraft,
    ) -> AppResult<ReviewView> {
        let draft = draft.normalized()?;
        if !self.reviewed.lock().unwrap().insert((property_id, user_id)) {
            return Err(AppError::conflict(DUPLICATE_REVIEW_MESSAGE));
        }
        let review = Review {
            id: Uuid::new_v4(),
            property_id,
            user_id,
            rating: draft.rating,
            title: draft.title,
            comment: draft.comment,
            likes: vec![],
            is_verified_stay: false,
            images: draft.images,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.reviews.lock().unwrap().push(review.clone());
        Ok(ReviewView::new(review, None))
    }

    async fn list_for_property(
        &self,
        _property_id: Uuid,
        _sort: ReviewSort,
        _page: PaginationParams,
    ) -> AppResult<Paginated<ReviewView>> {
        unused()
    }

    async fn update(
        &self,
        _user_id: Uuid,
        _review_id: Uuid,
        _patch: ReviewPatch,
    ) -> AppResult<ReviewView> {
        unused()
    }

    async fn delete(&self, _user_id: Uuid, _review_id: Uuid) -> AppResult<()> {
        unused()
    }

    async fn toggle_like(&self, user_id: Uuid, review_id: Uuid) -> AppResult<usize> {
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or_else(|| AppError::not_found("Review"))?;
        match review.likes.iter().position(|id| *id == user_id) {
            Some(pos) => {
                review.likes.remove(pos);
            }
            None => review.likes.push(user_id),
        }
        Ok(review.like_count())
    }

    async fn list_mine(
        &self,
        _user_id: Uuid,
        _page: PaginationParams,
    ) -> AppResult<Paginated<ReviewView>> {
        unused()
    }
}

struct FakeSubscriptions;

#[async_trait]
impl SubscriptionService for FakeSubscriptions {
    async fn create_plan(&self, _plan: NewPlan) -> AppResult<SubscriptionPlan> {
        unused()
    }

    async fn list_plans(&self) -> AppResult<Vec<SubscriptionPlan>> {
        Ok(vec![])
    }

    async fn subscribe(&self, _agent_id: Uuid, _plan_id: Uuid) -> AppResult<SubscriptionView> {
        Err(AppError::not_found("Subscription plan"))
    }

    async fn current(&self, _agent_id: Uuid) -> AppResult<SubscriptionView> {
        Err(AppError::not_found("Active subscription"))
    }
}

#[derive(Default)]
struct FakeSaved {
    favorites: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl SavedService for FakeSaved {
    async fn toggle(
        &self,
        _user_id: Uuid,
        list: SavedList,
        property_id: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        assert_eq!(list, SavedList::Favorites);
        let mut favorites = self.favorites.lock().unwrap();
        if let Some(pos) = favorites.iter().position(|id| *id == property_id) {
            favorites.remove(pos);
        } else {
            favorites.push(property_id);
        }
        Ok(favorites.clone())
    }

    async fn list(&self, _user_id: Uuid, _list: SavedList) -> AppResult<Vec<PropertyView>> {
        Ok(vec![])
    }

    async fn sync(&self, _user_id: Uuid, incoming: SavedLists) -> AppResult<SavedLists> {
        Ok(incoming)
    }
}

struct FakeImages;

#[async_trait]
impl ImageService for FakeImages {
    async fn upload_many(&self, files: Vec<Bytes>) -> AppResult<Vec<StoredImage>> {
        Ok(files
            .iter()
            .enumerate()
            .map(|(i, _)| StoredImage {
                key: format!("{}.jpg", i),
                url: format!("http://store.test/bucket/{}.jpg", i),
            })
            .collect())
    }

    async fn delete(&self, _key: String) -> AppResult<()> {
        Ok(())
    }

    async fn delete_urls(&self, _urls: Vec<String>) -> AppResult<()> {
        Ok(())
    }

    async fn discard(&self, _urls: Vec<String>) {}
}

struct FakeServices {
    auth: Arc<FakeAuth>,
    listings: Arc<FakeListings>,
    reviews: Arc<FakeReviews>,
    saved: Arc<FakeSaved>,
}

impl ServiceContainer for FakeServices {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn listings(&self) -> Arc<dyn ListingService> {
        self.listings.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewService> {
        self.reviews.clone()
    }

    fn subscriptions(&self) -> Arc<dyn SubscriptionService> {
        Arc::new(FakeSubscriptions)
    }

    fn saved(&self) -> Arc<dyn SavedService> {
        self.saved.clone()
    }

    fn images(&self) -> Arc<dyn ImageService> {
        Arc::new(FakeImages)
    }
}

// =============================================================================
// Helpers
// =============================================================================

struct TestApp {
    router: axum::Router,
    listing_id: Uuid,
}

fn sample_listing(owner_id: Uuid) -> PropertyView {
    PropertyView::new(
        Property {
            id: Uuid::new_v4(),
            title: "Garden house".to_string(),
            description: "Three bedrooms near the park".to_string(),
            price: 250_000.0,
            bedrooms: 3,
            bathrooms: 2,
            area: 140.0,
            property_type: PropertyType::House,
            status: ListingStatus::ForSale,
            owner_id,
            location_id: Uuid::new_v4(),
            images: vec![],
            details: PropertyDetails::default(),
            amenities: vec!["garden".to_string()],
            views: 0,
            average_rating: 0.0,
            total_reviews: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
        None,
        None,
    )
}

fn test_app() -> TestApp {
    let agent_id = Uuid::new_v4();
    let listing = sample_listing(agent_id);
    let listing_id = listing.property.id;

    let services = FakeServices {
        auth: Arc::new(FakeAuth {
            agent_id,
            user_id: Uuid::new_v4(),
        }),
        listings: Arc::new(FakeListings { listing }),
        reviews: Arc::new(FakeReviews::default()),
        saved: Arc::new(FakeSaved::default()),
    };

    TestApp {
        router: create_router(AppState::new(Arc::new(services))),
        listing_id,
    }
}

fn request(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn multipart_body(boundary: &str, data: &Value) -> String {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{data}\r\n--{b}--\r\n",
        b = boundary,
        data = data
    )
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_health_without_backends() {
    let app = test_app();
    let (status, body) = send(&app, request("GET", "/health", None).body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "unconfigured");
}

#[tokio::test]
async fn test_listing_search_is_public() {
    let app = test_app();

    let (status, body) = send(
        &app,
        request("GET", "/api/properties?min_bedrooms=2&page=1", None)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Garden house");

    let (status, body) = send(
        &app,
        request("GET", "/api/properties?min_bedrooms=4", None)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_get_unknown_property_is_not_found() {
    let app = test_app();
    let uri = format!("/api/properties/{}", Uuid::new_v4());
    let (status, body) = send(&app, request("GET", &uri, None).body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Property not found");

    let uri = format!("/api/properties/{}", app.listing_id);
    let (status, _) = send(&app, request("GET", &uri, None).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = test_app();

    let (status, _) = send(&app, request("GET", "/api/auth/me", None).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request("GET", "/api/properties/favorites", Some("forged"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_plain_user_cannot_use_agent_routes() {
    let app = test_app();

    let (status, body) = send(
        &app,
        request("GET", "/api/properties/my-properties", Some(USER_TOKEN))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized for this action");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/subscriptions/subscribe",
            Some(USER_TOKEN),
            json!({ "planId": Uuid::new_v4() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Agents pass the guard and reach the service.
    let (status, body) = send(
        &app,
        request("GET", "/api/subscriptions/my-subscription", Some(AGENT_TOKEN))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Active subscription not found");
}

#[tokio::test]
async fn test_create_listing_over_quota_is_forbidden() {
    let app = test_app();
    let boundary = "listing-boundary";
    let data = json!({
        "title": "Loft",
        "description": "Open plan",
        "price": 90000,
        "bedrooms": 1,
        "bathrooms": 1,
        "area": 55,
        "property_type": "apartment",
        "status": "for-sale",
        "location": { "country": "Rwanda", "province": "Kigali", "city": "Kigali" }
    });

    let req = request("POST", "/api/properties", Some(AGENT_TOKEN))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_body(boundary, &data)))
        .unwrap();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Property limit reached for current subscription");
}

#[tokio::test]
async fn test_create_listing_without_data_part_is_bad_request() {
    let app = test_app();
    let boundary = "no-data-boundary";

    let req = request("POST", "/api/properties", Some(AGENT_TOKEN))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
            b = boundary
        )))
        .unwrap();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Property data is required");
}

#[tokio::test]
async fn test_second_review_conflicts_and_likes_toggle() {
    let app = test_app();
    let uri = format!("/api/reviews/property/{}", app.listing_id);
    let review = json!({ "rating": 4, "title": "Lovely", "comment": "Quiet street" });

    let (status, body) = send(&app, json_request("POST", &uri, Some(USER_TOKEN), review.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["like_count"], 0);
    let review_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, json_request("POST", &uri, Some(USER_TOKEN), review)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], DUPLICATE_REVIEW_MESSAGE);

    let like_uri = format!("/api/reviews/{}/like", review_id);
    let (status, body) = send(
        &app,
        request("POST", &like_uri, Some(AGENT_TOKEN)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 1);

    let (_, body) = send(
        &app,
        request("POST", &like_uri, Some(AGENT_TOKEN)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(body["likes"], 0);
}

#[tokio::test]
async fn test_review_rating_out_of_range_is_rejected() {
    let app = test_app();
    let uri = format!("/api/reviews/property/{}", app.listing_id);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &uri,
            Some(USER_TOKEN),
            json!({ "rating": 6, "title": "Too good", "comment": "Really" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_favorite_toggle_returns_list() {
    let app = test_app();
    let uri = format!("/api/properties/{}/favorite", app.listing_id);

    let (status, body) = send(
        &app,
        request("POST", &uri, Some(USER_TOKEN)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorites"], json!([app.listing_id]));

    let (_, body) = send(
        &app,
        request("POST", &uri, Some(USER_TOKEN)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(body["favorites"], json!([]));
}

#[tokio::test]
async fn test_register_validates_payload() {
    let app = test_app();

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Ana", "email": "not-an-email", "password": "short", "phoneNumber": "1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "name": "Ana",
                "email": "ana@example.com",
                "password": "long-enough-secret",
                "phoneNumber": "+250788000001",
                "role": "agent"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["userId"].is_string());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app();
    let (status, body) = send(
        &app,
        request("GET", "/api-docs/openapi.json", None).body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/properties"].is_object());
}
