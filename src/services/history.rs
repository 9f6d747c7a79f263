// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-member check-in history and metrics.

use crate::db::{CheckInsRepository, RepositoryError};
use crate::models::CheckIn;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct CheckInHistoryService {
    check_ins: Arc<dyn CheckInsRepository>,
}

impl CheckInHistoryService {
    pub fn new(check_ins: Arc<dyn CheckInsRepository>) -> Self {
        Self { check_ins }
    }

    /// One page (20 items) of the member's check-ins, oldest first.
    pub async fn history(&self, user_id: Uuid, page: u32) -> Result<Vec<CheckIn>, RepositoryError> {
        self.check_ins.find_many_by_user(user_id, page).await
    }

    /// Total number of check-ins by the member.
    pub async fn count(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        self.check_ins.count_by_user(user_id).await
    }
}
