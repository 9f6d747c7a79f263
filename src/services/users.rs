// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member registration, password authentication and profile lookup.

use crate::db::{RepositoryError, UsersRepository};
use crate::models::{NewUser, Role, User};
use std::sync::Arc;
use uuid::Uuid;

/// Failures of user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("E-mail already exists")]
    AlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Resource not found")]
    ResourceNotFound,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepository>,
    /// bcrypt cost factor
    hash_cost: u32,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepository>, hash_cost: u32) -> Self {
        Self { users, hash_cost }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, UserError> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(UserError::AlreadyExists);
        }

        let password = request.password;
        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| UserError::PasswordHash(e.to_string()))?
            .map_err(|e| UserError::PasswordHash(e.to_string()))?;

        let user = self
            .users
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role: request.role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => UserError::AlreadyExists,
                other => UserError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check an email/password pair.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        let password = password.to_string();
        let password_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
            .await
            .map_err(|e| UserError::PasswordHash(e.to_string()))?
            .map_err(|e| UserError::PasswordHash(e.to_string()))?;

        if !matches {
            tracing::debug!(user_id = %user.id, "Rejected login: wrong password");
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, UserError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::ResourceNotFound)
    }
}
