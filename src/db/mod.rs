// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer: repository traits plus Firestore and in-memory backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::{InMemoryCheckInsRepository, InMemoryGymsRepository, InMemoryUsersRepository};

use crate::distance::Coordinate;
use crate::models::{CheckIn, Gym, NewCheckIn, NewGym, NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Items per page for every paginated listing.
pub const PAGE_SIZE: usize = 20;

/// Radius used by nearby-gym searches.
pub const NEARBY_RADIUS_KM: f64 = 10.0;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email uniqueness markers (keyed by url-encoded email)
    pub const USER_EMAILS: &str = "user_emails";
    pub const GYMS: &str = "gyms";
    pub const CHECK_INS: &str = "check_ins";
    /// One document per (user, UTC day), keyed `{user_id}_{YYYY-MM-DD}`
    pub const CHECK_IN_DAYS: &str = "check_in_days";
}

/// Errors from any repository backend.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A uniqueness rule enforced by the store rejected the write.
    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Backend(String),
}

/// Zero-based offset of a 1-based page. Page 0 is treated as page 1.
pub fn page_offset(page: u32) -> usize {
    (page.max(1) as usize - 1) * PAGE_SIZE
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Store a new user. Fails with `Conflict` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait GymsRepository: Send + Sync {
    async fn create(&self, gym: NewGym) -> Result<Gym, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Gym>, RepositoryError>;
    /// Gyms whose title contains `query`, `PAGE_SIZE` per 1-based page.
    async fn search_many(&self, query: &str, page: u32) -> Result<Vec<Gym>, RepositoryError>;
    /// Gyms within `NEARBY_RADIUS_KM` of `origin`.
    async fn find_many_nearby(&self, origin: Coordinate) -> Result<Vec<Gym>, RepositoryError>;
}

#[async_trait]
pub trait CheckInsRepository: Send + Sync {
    /// Record a pending check-in.
    ///
    /// Fails with `Conflict` if the user already has a check-in on the
    /// UTC calendar day of `created_at`.
    async fn create(&self, check_in: NewCheckIn) -> Result<CheckIn, RepositoryError>;

    /// Full-record update.
    ///
    /// Fails with `Conflict` if the stored record already carries a
    /// different `validated_at`.
    async fn save(&self, check_in: &CheckIn) -> Result<CheckIn, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CheckIn>, RepositoryError>;

    /// The user's check-in on the UTC calendar day containing `date`, if any.
    async fn find_by_user_on_date(
        &self,
        user_id: Uuid,
        date: DateTime<Utc>,
    ) -> Result<Option<CheckIn>, RepositoryError>;

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError>;

    /// The user's check-ins ordered by creation, `PAGE_SIZE` per 1-based page.
    async fn find_many_by_user(
        &self,
        user_id: Uuid,
        page: u32,
    ) -> Result<Vec<CheckIn>, RepositoryError>;
}
