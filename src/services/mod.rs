// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod check_in;
pub mod gyms;
pub mod history;
pub mod users;
pub mod validate_check_in;

pub use check_in::{CheckInError, CheckInRequest, CheckInService, MAX_DISTANCE_KM};
pub use gyms::GymService;
pub use history::CheckInHistoryService;
pub use users::{RegisterRequest, UserError, UserService};
pub use validate_check_in::{ValidateCheckInService, VALIDATION_WINDOW_MINUTES};
