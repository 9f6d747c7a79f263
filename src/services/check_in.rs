// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in eligibility: distance and once-per-day rules.
//!
//! A check-in is accepted when:
//! 1. The gym exists
//! 2. The member is within `MAX_DISTANCE_KM` of the gym
//! 3. The member has no check-in yet on the current UTC day
//!
//! Only the final ledger write mutates state. The per-day rule is checked
//! up front and enforced again by the ledger's own uniqueness constraint,
//! so concurrent attempts for the same day admit exactly one.

use crate::clock::Clock;
use crate::db::{CheckInsRepository, GymsRepository, RepositoryError};
use crate::distance::{distance_km, Coordinate};
use crate::models::{CheckIn, NewCheckIn};
use std::sync::Arc;
use uuid::Uuid;

/// Farthest a member may be from the gym when checking in.
pub const MAX_DISTANCE_KM: f64 = 0.1;

/// Business-rule failures of the check-in engines.
#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("Resource not found")]
    ResourceNotFound,

    #[error("Too far from the gym ({distance_km:.3} km)")]
    MaxDistanceExceeded { distance_km: f64 },

    #[error("Already checked in today")]
    MaxCheckInsReached,

    #[error("Check-in can only be validated within 20 minutes of its creation")]
    LateValidationWindowExpired,

    #[error("Check-in already validated")]
    AlreadyValidated,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Input for a check-in attempt.
#[derive(Debug, Clone)]
pub struct CheckInRequest {
    pub user_id: Uuid,
    pub gym_id: Uuid,
    pub user_latitude: f64,
    pub user_longitude: f64,
}

/// Creates check-ins for members standing at a gym.
#[derive(Clone)]
pub struct CheckInService {
    check_ins: Arc<dyn CheckInsRepository>,
    gyms: Arc<dyn GymsRepository>,
    clock: Arc<dyn Clock>,
}

impl CheckInService {
    pub fn new(
        check_ins: Arc<dyn CheckInsRepository>,
        gyms: Arc<dyn GymsRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            check_ins,
            gyms,
            clock,
        }
    }

    pub async fn execute(&self, request: CheckInRequest) -> Result<CheckIn, CheckInError> {
        let gym = self
            .gyms
            .find_by_id(request.gym_id)
            .await?
            .ok_or(CheckInError::ResourceNotFound)?;

        let distance = distance_km(
            Coordinate::new(request.user_latitude, request.user_longitude),
            gym.location(),
        );

        if distance > MAX_DISTANCE_KM {
            tracing::debug!(
                user_id = %request.user_id,
                gym_id = %request.gym_id,
                distance_km = distance,
                "Check-in rejected: too far from gym"
            );
            return Err(CheckInError::MaxDistanceExceeded {
                distance_km: distance,
            });
        }

        let now = self.clock.now();

        if self
            .check_ins
            .find_by_user_on_date(request.user_id, now)
            .await?
            .is_some()
        {
            tracing::debug!(
                user_id = %request.user_id,
                "Check-in rejected: already checked in today"
            );
            return Err(CheckInError::MaxCheckInsReached);
        }

        let check_in = self
            .check_ins
            .create(NewCheckIn {
                user_id: request.user_id,
                gym_id: request.gym_id,
                created_at: now,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent check-in for the same day
                RepositoryError::Conflict(_) => CheckInError::MaxCheckInsReached,
                other => CheckInError::Repository(other),
            })?;

        tracing::info!(
            check_in_id = %check_in.id,
            user_id = %check_in.user_id,
            gym_id = %check_in.gym_id,
            "Check-in created"
        );

        Ok(check_in)
    }
}
