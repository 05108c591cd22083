//! Service container: one place handlers reach every use case through.

use std::future::Future;
use std::sync::Arc;

use super::{
    AuthService, Authenticator, ImagePipeline, ImageService, ListingManager, ListingService,
    QuotaEngine, RatingAggregator, ReviewManager, ReviewService, SavedManager, SavedService,
    SubscriptionManager, SubscriptionService,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{ImageStore, Persistence};
use crate::jobs::Mailer;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn listings(&self) -> Arc<dyn ListingService>;

    fn reviews(&self) -> Arc<dyn ReviewService>;

    fn subscriptions(&self) -> Arc<dyn SubscriptionService>;

    /// Favorites and wishlist.
    fn saved(&self) -> Arc<dyn SavedService>;

    fn images(&self) -> Arc<dyn ImageService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth: Arc<dyn AuthService>,
    listings: Arc<dyn ListingService>,
    reviews: Arc<dyn ReviewService>,
    subscriptions: Arc<dyn SubscriptionService>,
    saved: Arc<dyn SavedService>,
    images: Arc<dyn ImageService>,
}

impl Services {
    pub fn new(
        auth: Arc<dyn AuthService>,
        listings: Arc<dyn ListingService>,
        reviews: Arc<dyn ReviewService>,
        subscriptions: Arc<dyn SubscriptionService>,
        saved: Arc<dyn SavedService>,
        images: Arc<dyn ImageService>,
    ) -> Self {
        Self {
            auth,
            listings,
            reviews,
            subscriptions,
            saved,
            images,
        }
    }

    /// Wire every service over the database, object store and mail queue.
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        image_store: Arc<dyn ImageStore>,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        let images: Arc<dyn ImageService> = Arc::new(ImagePipeline::new(image_store));
        let quota = Arc::new(QuotaEngine::new(uow.clone()));
        let ratings = Arc::new(RatingAggregator::new(uow.clone()));

        Self {
            auth: Arc::new(Authenticator::new(uow.clone(), mailer, config)),
            listings: Arc::new(ListingManager::new(uow.clone(), quota, images.clone())),
            reviews: Arc::new(ReviewManager::new(uow.clone(), ratings)),
            subscriptions: Arc::new(SubscriptionManager::new(uow.clone())),
            saved: Arc::new(SavedManager::new(uow)),
            images,
        }
    }
}

impl ServiceContainer for Services {
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
        self.subscriptions.clone()
    }

    fn saved(&self) -> Arc<dyn SavedService> {
        self.saved.clone()
    }

    fn images(&self) -> Arc<dyn ImageService> {
        self.images.clone()
    }
}

/// Helpers for running independent fallible operations concurrently.
pub mod parallel {
    use super::*;

    /// Await every future; the first error wins, results keep input order.
    pub async fn join_all<F, T>(futures: Vec<F>) -> AppResult<Vec<T>>
    where
        F: Future<Output = AppResult<T>>,
    {
        let results = futures::future::join_all(futures).await;
        results.into_iter().collect()
    }
}
