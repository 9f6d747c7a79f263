// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in validation: pending -> validated within a fixed window.
//!
//! Callers must already be authorized (admin role is enforced by
//! `middleware::require_admin`); this service performs no identity checks.

use super::check_in::CheckInError;
use crate::clock::Clock;
use crate::db::{CheckInsRepository, RepositoryError};
use crate::models::CheckIn;
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

/// Minutes after creation during which a check-in can still be validated.
pub const VALIDATION_WINDOW_MINUTES: i64 = 20;

/// Marks pending check-ins as validated.
#[derive(Clone)]
pub struct ValidateCheckInService {
    check_ins: Arc<dyn CheckInsRepository>,
    clock: Arc<dyn Clock>,
}

impl ValidateCheckInService {
    pub fn new(check_ins: Arc<dyn CheckInsRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { check_ins, clock }
    }

    pub async fn execute(&self, check_in_id: Uuid) -> Result<CheckIn, CheckInError> {
        let mut check_in = self
            .check_ins
            .find_by_id(check_in_id)
            .await?
            .ok_or(CheckInError::ResourceNotFound)?;

        if check_in.is_validated() {
            return Err(CheckInError::AlreadyValidated);
        }

        let now = self.clock.now();
        let elapsed = now - check_in.created_at;

        if elapsed > Duration::minutes(VALIDATION_WINDOW_MINUTES) {
            tracing::debug!(
                check_in_id = %check_in_id,
                elapsed_secs = elapsed.num_seconds(),
                "Validation rejected: window expired"
            );
            return Err(CheckInError::LateValidationWindowExpired);
        }

        check_in.validated_at = Some(now);

        let saved = self.check_ins.save(&check_in).await.map_err(|e| match e {
            // Another validator got there first
            RepositoryError::Conflict(_) => CheckInError::AlreadyValidated,
            other => CheckInError::Repository(other),
        })?;

        tracing::info!(check_in_id = %saved.id, user_id = %saved.user_id, "Check-in validated");

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::InMemoryCheckInsRepository;
    use crate::models::NewCheckIn;
    use chrono::{TimeZone, Utc};

    async fn setup() -> (
        Arc<InMemoryCheckInsRepository>,
        Arc<FixedClock>,
        ValidateCheckInService,
        CheckIn,
    ) {
        let check_ins = Arc::new(InMemoryCheckInsRepository::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 8, 25, 9, 0, 0).unwrap(),
        ));
        let check_in = check_ins
            .create(NewCheckIn {
                user_id: Uuid::new_v4(),
                gym_id: Uuid::new_v4(),
                created_at: clock.now(),
            })
            .await
            .unwrap();
        let sut = ValidateCheckInService::new(check_ins.clone(), clock.clone());
        (check_ins, clock, sut, check_in)
    }

    #[tokio::test]
    async fn test_validate_within_window() {
        let (check_ins, clock, sut, check_in) = setup().await;
        clock.advance(Duration::minutes(5));

        let validated = sut.execute(check_in.id).await.unwrap();
        assert_eq!(validated.validated_at, Some(clock.now()));

        let stored = check_ins.find_by_id(check_in.id).await.unwrap().unwrap();
        assert_eq!(stored.validated_at, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_unknown_check_in_is_not_found() {
        let (_, _, sut, _) = setup().await;

        let result = sut.execute(Uuid::new_v4()).await;
        assert!(matches!(result, Err(CheckInError::ResourceNotFound)));
    }

    #[tokio::test]
    async fn test_window_boundary_is_inclusive() {
        let (_, clock, sut, check_in) = setup().await;
        clock.advance(Duration::minutes(VALIDATION_WINDOW_MINUTES));

        assert!(sut.execute(check_in.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_late_validation_is_rejected() {
        let (check_ins, clock, sut, check_in) = setup().await;
        clock.advance(Duration::minutes(21));

        let result = sut.execute(check_in.id).await;
        assert!(matches!(
            result,
            Err(CheckInError::LateValidationWindowExpired)
        ));

        let stored = check_ins.find_by_id(check_in.id).await.unwrap().unwrap();
        assert!(stored.validated_at.is_none());
    }

    #[tokio::test]
    async fn test_one_second_past_window_is_rejected() {
        let (_, clock, sut, check_in) = setup().await;
        clock.advance(Duration::minutes(VALIDATION_WINDOW_MINUTES) + Duration::seconds(1));

        assert!(matches!(
            sut.execute(check_in.id).await,
            Err(CheckInError::LateValidationWindowExpired)
        ));
    }

    #[tokio::test]
    async fn test_second_validation_is_rejected() {
        let (check_ins, clock, sut, check_in) = setup().await;
        clock.advance(Duration::minutes(1));
        let first = sut.execute(check_in.id).await.unwrap();

        clock.advance(Duration::minutes(1));
        assert!(matches!(
            sut.execute(check_in.id).await,
            Err(CheckInError::AlreadyValidated)
        ));

        let stored = check_ins.find_by_id(check_in.id).await.unwrap().unwrap();
        assert_eq!(stored.validated_at, first.validated_at);
    }

    #[tokio::test]
    async fn test_concurrent_validations_store_one_timestamp() {
        let (check_ins, clock, _, check_in) = setup().await;

        let mut handles = vec![];
        for i in 0..8 {
            // Each validator sees a slightly different "now"
            let clock = Arc::new(FixedClock::new(clock.now() + Duration::seconds(i)));
            let sut = ValidateCheckInService::new(check_ins.clone(), clock);
            let id = check_in.id;
            handles.push(tokio::spawn(async move { sut.execute(id).await }));
        }

        let mut winners = vec![];
        for handle in handles {
            match handle.await.unwrap() {
                Ok(c) => winners.push(c.validated_at),
                Err(CheckInError::AlreadyValidated) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(winners.len(), 1);
        let stored = check_ins.find_by_id(check_in.id).await.unwrap().unwrap();
        assert_eq!(stored.validated_at, winners[0]);
    }
}
