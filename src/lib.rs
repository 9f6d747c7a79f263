// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gym check-in service.
//!
//! Members register, find gyms by title or proximity and check in once per
//! day when standing within 100 m of a gym. Admins validate check-ins up to
//! 20 minutes after they were made.

pub mod clock;
pub mod config;
pub mod db;
pub mod distance;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use clock::{Clock, SystemClock};
use config::Config;
use db::{
    CheckInsRepository, GymsRepository, InMemoryCheckInsRepository, InMemoryGymsRepository,
    InMemoryUsersRepository, UsersRepository,
};
use services::{
    CheckInHistoryService, CheckInService, GymService, UserService, ValidateCheckInService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UsersRepository>,
    pub gyms: Arc<dyn GymsRepository>,
    pub check_ins: Arc<dyn CheckInsRepository>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// State backed by process-local repositories and the given clock.
    pub fn in_memory(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            users: Arc::new(InMemoryUsersRepository::new()),
            gyms: Arc::new(InMemoryGymsRepository::new()),
            check_ins: Arc::new(InMemoryCheckInsRepository::new()),
            clock,
        }
    }

    /// State backed by a single Firestore client for every repository.
    pub fn with_firestore(config: Config, db: db::FirestoreDb) -> Self {
        let db = Arc::new(db);
        Self {
            config,
            users: db.clone(),
            gyms: db.clone(),
            check_ins: db,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.users.clone(), self.config.password_hash_cost)
    }

    pub fn gym_service(&self) -> GymService {
        GymService::new(self.gyms.clone())
    }

    pub fn check_in_service(&self) -> CheckInService {
        CheckInService::new(self.check_ins.clone(), self.gyms.clone(), self.clock.clone())
    }

    pub fn validate_check_in_service(&self) -> ValidateCheckInService {
        ValidateCheckInService::new(self.check_ins.clone(), self.clock.clone())
    }

    pub fn history_service(&self) -> CheckInHistoryService {
        CheckInHistoryService::new(self.check_ins.clone())
    }
}
