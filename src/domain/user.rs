//! User domain entity and related types.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{ACCOUNT_TOKEN_BYTES, ROLE_ADMIN, ROLE_AGENT, ROLE_USER};

/// User roles enumeration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Agent,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Agents and admins may publish listings.
    pub fn can_list_properties(&self) -> bool {
        matches!(self, UserRole::Agent | UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            ROLE_AGENT => UserRole::Agent,
            _ => UserRole::User,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::Agent => write!(f, "{}", ROLE_AGENT),
            UserRole::User => write!(f, "{}", ROLE_USER),
        }
    }
}

/// A one-shot token mailed to the user (email verification, password reset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingToken {
    /// Fresh random hex token expiring `ttl_hours` from now.
    pub fn generate(ttl_hours: i64) -> Self {
        let mut bytes = [0u8; ACCOUNT_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            token: hex::encode(bytes),
            expires_at: Utc::now() + Duration::hours(ttl_hours),
        }
    }

    pub fn is_valid(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        self.token == candidate && self.expires_at > now
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_verified: bool,
    #[serde(skip)]
    pub verification: Option<PendingToken>,
    #[serde(skip)]
    pub password_reset: Option<PendingToken>,
    pub favorites: Vec<Uuid>,
    pub wishlist: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// The authenticated caller of a use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }
}

/// Which saved-property list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedList {
    Favorites,
    Wishlist,
}

/// Union `incoming` into `list`, keeping the existing order and skipping duplicates.
pub fn merge_ids(list: &mut Vec<Uuid>, incoming: impl IntoIterator<Item = Uuid>) {
    for id in incoming {
        if !list.contains(&id) {
            list.push(id);
        }
    }
}

/// Registration data handed to the store
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: UserRole,
    pub verification: PendingToken,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "+250788000000")]
    pub phone_number: String,
    #[schema(example = "agent")]
    pub role: String,
    pub is_verified: bool,
    pub favorites: Vec<Uuid>,
    pub wishlist: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role.to_string(),
            is_verified: user.is_verified,
            favorites: user.favorites,
            wishlist: user.wishlist,
            created_at: user.created_at,
        }
    }
}

/// Owner as embedded in listing responses (name and email only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(UserRole::from("agent"), UserRole::Agent);
        assert_eq!(UserRole::from("admin"), UserRole::Admin);
        assert_eq!(UserRole::from("unknown"), UserRole::User);
        assert_eq!(UserRole::Agent.to_string(), "agent");
    }

    #[test]
    fn test_listing_permission() {
        assert!(UserRole::Agent.can_list_properties());
        assert!(UserRole::Admin.can_list_properties());
        assert!(!UserRole::User.can_list_properties());
    }

    #[test]
    fn test_pending_token_expiry() {
        let now = Utc::now();
        let token = PendingToken {
            token: "abc".into(),
            expires_at: now + Duration::hours(1),
        };
        assert!(token.is_valid("abc", now));
        assert!(!token.is_valid("abd", now));
        assert!(!token.is_valid("abc", now + Duration::hours(2)));
    }

    #[test]
    fn test_generated_tokens_are_unique_hex() {
        let a = PendingToken::generate(24);
        let b = PendingToken::generate(24);
        assert_eq!(a.token.len(), ACCOUNT_TOKEN_BYTES * 2);
        assert!(a.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.token, b.token);
        assert!(a.expires_at > Utc::now() + Duration::hours(23));
    }

    #[test]
    fn test_merge_ids_is_a_union() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut list = vec![a];
        merge_ids(&mut list, vec![b, a, b]);
        assert_eq!(list, vec![a, b]);
    }
}
