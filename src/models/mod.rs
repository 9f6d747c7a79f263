// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod check_in;
pub mod gym;
pub mod user;

pub use check_in::{CheckIn, NewCheckIn};
pub use gym::{Gym, NewGym};
pub use user::{NewUser, Role, User, UserProfile};
