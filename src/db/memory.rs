// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process repositories for tests and local development.
//!
//! Uniqueness rules (user email, one check-in per user per UTC day) are
//! enforced with `DashMap` entries so concurrent writers observe the same
//! guarantees as the Firestore backend.

use super::{
    page_offset, CheckInsRepository, GymsRepository, RepositoryError, UsersRepository,
    NEARBY_RADIUS_KM, PAGE_SIZE,
};
use crate::distance::{bounding_box, distance_km, Coordinate};
use crate::models::{CheckIn, Gym, NewCheckIn, NewGym, NewUser, User};
use crate::time_utils::day_key;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use geo::Intersects;
use tokio::sync::RwLock;
use uuid::Uuid;

// ─── Users ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryUsersRepository {
    users: DashMap<Uuid, User>,
    /// email -> user id
    emails: DashMap<String, Uuid>,
}

impl InMemoryUsersRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict(format!(
                "Email {} already registered",
                user.email
            ))),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    role: user.role,
                    created_at: Utc::now(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .emails
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|u| u.value().clone())))
    }
}

// ─── Gyms ────────────────────────────────────────────────────

/// Gyms kept in insertion order, which is also the search result order.
#[derive(Default)]
pub struct InMemoryGymsRepository {
    gyms: RwLock<Vec<Gym>>,
}

impl InMemoryGymsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GymsRepository for InMemoryGymsRepository {
    async fn create(&self, gym: NewGym) -> Result<Gym, RepositoryError> {
        let gym = Gym {
            id: Uuid::new_v4(),
            title: gym.title,
            description: gym.description,
            phone: gym.phone,
            latitude: gym.latitude,
            longitude: gym.longitude,
        };

        self.gyms.write().await.push(gym.clone());
        Ok(gym)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Gym>, RepositoryError> {
        Ok(self.gyms.read().await.iter().find(|g| g.id == id).cloned())
    }

    async fn search_many(&self, query: &str, page: u32) -> Result<Vec<Gym>, RepositoryError> {
        Ok(self
            .gyms
            .read()
            .await
            .iter()
            .filter(|g| g.title.contains(query))
            .skip(page_offset(page))
            .take(PAGE_SIZE)
            .cloned()
            .collect())
    }

    async fn find_many_nearby(&self, origin: Coordinate) -> Result<Vec<Gym>, RepositoryError> {
        let bbox = bounding_box(origin, NEARBY_RADIUS_KM);

        Ok(self
            .gyms
            .read()
            .await
            .iter()
            .filter(|g| bbox.intersects(&geo::Point::from(g.location())))
            .filter(|g| distance_km(origin, g.location()) <= NEARBY_RADIUS_KM)
            .cloned()
            .collect())
    }
}

// ─── Check-ins ───────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryCheckInsRepository {
    check_ins: DashMap<Uuid, CheckIn>,
    /// (user id, UTC day key) -> check-in id
    days: DashMap<(Uuid, String), Uuid>,
}

impl InMemoryCheckInsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckInsRepository for InMemoryCheckInsRepository {
    async fn create(&self, new: NewCheckIn) -> Result<CheckIn, RepositoryError> {
        let day = day_key(new.created_at);

        match self.days.entry((new.user_id, day.clone())) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict(format!(
                "User {} already checked in on {}",
                new.user_id, day
            ))),
            Entry::Vacant(slot) => {
                let check_in = CheckIn {
                    id: Uuid::new_v4(),
                    user_id: new.user_id,
                    gym_id: new.gym_id,
                    created_at: new.created_at,
                    validated_at: None,
                };
                self.check_ins.insert(check_in.id, check_in.clone());
                slot.insert(check_in.id);
                Ok(check_in)
            }
        }
    }

    async fn save(&self, check_in: &CheckIn) -> Result<CheckIn, RepositoryError> {
        let mut stored = self.check_ins.get_mut(&check_in.id).ok_or_else(|| {
            RepositoryError::Backend(format!("Check-in {} not found", check_in.id))
        })?;

        if stored.user_id != check_in.user_id
            || stored.gym_id != check_in.gym_id
            || stored.created_at != check_in.created_at
        {
            return Err(RepositoryError::Conflict(format!(
                "Check-in {} identity fields are immutable",
                check_in.id
            )));
        }

        if stored.validated_at.is_some() && stored.validated_at != check_in.validated_at {
            return Err(RepositoryError::Conflict(format!(
                "Check-in {} already validated",
                check_in.id
            )));
        }

        *stored = check_in.clone();
        Ok(stored.value().clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CheckIn>, RepositoryError> {
        Ok(self.check_ins.get(&id).map(|c| c.value().clone()))
    }

    async fn find_by_user_on_date(
        &self,
        user_id: Uuid,
        date: DateTime<Utc>,
    ) -> Result<Option<CheckIn>, RepositoryError> {
        Ok(self
            .days
            .get(&(user_id, day_key(date)))
            .and_then(|id| self.check_ins.get(id.value()).map(|c| c.value().clone())))
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        Ok(self
            .check_ins
            .iter()
            .filter(|c| c.user_id == user_id)
            .count() as u64)
    }

    async fn find_many_by_user(
        &self,
        user_id: Uuid,
        page: u32,
    ) -> Result<Vec<CheckIn>, RepositoryError> {
        let mut items: Vec<CheckIn> = self
            .check_ins
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.value().clone())
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(items
            .into_iter()
            .skip(page_offset(page))
            .take(PAGE_SIZE)
            .collect())
    }
}
