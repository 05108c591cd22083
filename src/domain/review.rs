//! Property reviews, likes and the rating summary derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::config::{
    MAX_REVIEW_COMMENT_LENGTH, MAX_REVIEW_RATING, MAX_REVIEW_TITLE_LENGTH, MIN_REVIEW_RATING,
};
use crate::errors::{AppError, AppResult};

/// One user's review of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub property_id: Uuid,
    pub user_id: Uuid,
    #[schema(example = 4)]
    pub rating: i32,
    pub title: String,
    pub comment: String,
    /// Users who liked this review
    pub likes: Vec<Uuid>,
    pub is_verified_stay: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}

/// Reviewer as shown next to a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReviewerSummary {
    pub id: Uuid,
    pub name: String,
}

/// Review returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub like_count: usize,
    pub user: Option<ReviewerSummary>,
}

impl ReviewView {
    pub fn new(review: Review, user: Option<ReviewerSummary>) -> Self {
        Self {
            like_count: review.like_count(),
            review,
            user,
        }
    }
}

/// Review submission body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewDraft {
    #[schema(minimum = 1, maximum = 5)]
    pub rating: i32,
    #[schema(max_length = 100)]
    pub title: String,
    #[schema(max_length = 1000)]
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ReviewDraft {
    /// Trim text fields and check rating and lengths.
    pub fn normalized(self) -> AppResult<Self> {
        Ok(Self {
            rating: check_rating(self.rating)?,
            title: check_text("Title", &self.title, MAX_REVIEW_TITLE_LENGTH)?,
            comment: check_text("Comment", &self.comment, MAX_REVIEW_COMMENT_LENGTH)?,
            images: self.images,
        })
    }
}

/// Partial review update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct ReviewPatch {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub images: Option<Vec<String>>,
}

impl ReviewPatch {
    pub fn normalized(self) -> AppResult<Self> {
        Ok(Self {
            rating: self.rating.map(check_rating).transpose()?,
            title: self
                .title
                .map(|t| check_text("Title", &t, MAX_REVIEW_TITLE_LENGTH))
                .transpose()?,
            comment: self
                .comment
                .map(|c| check_text("Comment", &c, MAX_REVIEW_COMMENT_LENGTH))
                .transpose()?,
            images: self.images,
        })
    }
}

fn check_rating(rating: i32) -> AppResult<i32> {
    if (MIN_REVIEW_RATING..=MAX_REVIEW_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(AppError::validation(format!(
            "Rating must be between {} and {}",
            MIN_REVIEW_RATING, MAX_REVIEW_RATING
        )))
    }
}

fn check_text(field: &str, value: &str, max: usize) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::validation(format!(
            "{} cannot exceed {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Store-ready review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub images: Vec<String>,
}

impl NewReview {
    pub fn from_draft(draft: ReviewDraft, property_id: Uuid, user_id: Uuid) -> Self {
        Self {
            property_id,
            user_id,
            rating: draft.rating,
            title: draft.title,
            comment: draft.comment,
            images: draft.images,
        }
    }
}

/// Ordering of a property's review list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewSortQuery {
    #[param(value_type = Option<String>, example = "highest")]
    #[serde(default)]
    pub sort: ReviewSort,
}

/// Average rating and review count of a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: i32,
}

impl RatingSummary {
    /// Mean and count over the full review set; an empty set is 0/0.
    pub fn from_ratings(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        Self {
            average_rating: sum as f64 / ratings.len() as f64,
            total_reviews: ratings.len() as i32,
        }
    }
}
