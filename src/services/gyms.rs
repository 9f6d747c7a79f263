// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym directory operations: create, search by title, find nearby.

use crate::db::{GymsRepository, RepositoryError};
use crate::distance::Coordinate;
use crate::models::{Gym, NewGym};
use std::sync::Arc;

/// Thin service over the gym directory.
#[derive(Clone)]
pub struct GymService {
    gyms: Arc<dyn GymsRepository>,
}

impl GymService {
    pub fn new(gyms: Arc<dyn GymsRepository>) -> Self {
        Self { gyms }
    }

    pub async fn create(&self, gym: NewGym) -> Result<Gym, RepositoryError> {
        let gym = self.gyms.create(gym).await?;
        tracing::info!(gym_id = %gym.id, title = %gym.title, "Gym created");
        Ok(gym)
    }

    /// Gyms whose title contains `query`, 20 per 1-based page.
    pub async fn search(&self, query: &str, page: u32) -> Result<Vec<Gym>, RepositoryError> {
        self.gyms.search_many(query, page).await
    }

    /// Gyms within 10 km of the member.
    pub async fn nearby(&self, origin: Coordinate) -> Result<Vec<Gym>, RepositoryError> {
        self.gyms.find_many_nearby(origin).await
    }
}
