// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Check-in model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// A member's presence claim at a gym, pending until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub gym_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// `None` while pending; set exactly once on validation
    pub validated_at: Option<DateTime<Utc>>,
}

impl CheckIn {
    pub fn is_validated(&self) -> bool {
        self.validated_at.is_some()
    }
}

/// Fields needed to record a check-in.
#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub user_id: Uuid,
    pub gym_id: Uuid,
    pub created_at: DateTime<Utc>,
}
