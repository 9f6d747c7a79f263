// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing the repository traits.
//!
//! Collections:
//! - `users` / `user_emails` (profile + email uniqueness marker)
//! - `gyms`
//! - `check_ins` / `check_in_days` (record + per-day uniqueness marker)
//!
//! Uniqueness is enforced with marker documents whose id encodes the unique
//! key. The marker and the record it guards are written in one transaction
//! after reading the marker inside it, so a concurrent writer is retried by
//! Firestore, sees the marker and reports `RepositoryError::Conflict`.

use super::{
    collections, page_offset, CheckInsRepository, GymsRepository, RepositoryError,
    UsersRepository, NEARBY_RADIUS_KM, PAGE_SIZE,
};
use crate::distance::{bounding_box, distance_km, Coordinate};
use crate::models::{CheckIn, Gym, NewCheckIn, NewGym, NewUser, Role, User};
use crate::time_utils::{day_key, format_utc_rfc3339, parse_utc_rfc3339};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::{BackoffError, FirestoreError};
use firestore::FirestoreWritePrecondition;
use futures_util::{future, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

fn db_error(e: FirestoreError) -> RepositoryError {
    match e {
        e @ FirestoreError::DataConflictError(_) => RepositoryError::Conflict(e.to_string()),
        other => RepositoryError::Backend(other.to_string()),
    }
}

/// What a read-check-write transaction decided.
enum TxOutcome {
    Written,
    /// The guarded document was absent
    Missing,
    /// The uniqueness or write-once rule was already taken
    Conflict,
}

type TxResult = Result<TxOutcome, BackoffError<FirestoreError>>;

const PAGE_LIMIT: u32 = PAGE_SIZE as u32;

fn parse_uuid(raw: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(raw).map_err(|e| RepositoryError::Backend(format!("Bad id {}: {}", raw, e)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    parse_utc_rfc3339(raw)
        .map_err(|e| RepositoryError::Backend(format!("Bad timestamp {}: {}", raw, e)))
}

// ─── Stored document shapes ──────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    created_at: String,
}

impl From<&User> for UserDocument {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name.clone(),
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            role: u.role,
            created_at: format_utc_rfc3339(u.created_at),
        }
    }
}

impl TryFrom<UserDocument> for User {
    type Error = RepositoryError;

    fn try_from(doc: UserDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&doc.id)?,
            name: doc.name,
            email: doc.email,
            password_hash: doc.password_hash,
            role: doc.role,
            created_at: parse_timestamp(&doc.created_at)?,
        })
    }
}

/// Marker claiming an email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailMarker {
    user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GymDocument {
    id: String,
    title: String,
    description: Option<String>,
    phone: Option<String>,
    latitude: f64,
    longitude: f64,
    created_at: String,
}

impl TryFrom<GymDocument> for Gym {
    type Error = RepositoryError;

    fn try_from(doc: GymDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&doc.id)?,
            title: doc.title,
            description: doc.description,
            phone: doc.phone,
            latitude: doc.latitude,
            longitude: doc.longitude,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckInDocument {
    id: String,
    user_id: String,
    gym_id: String,
    created_at: String,
    validated_at: Option<String>,
    /// UTC day bucket of `created_at`
    day: String,
}

impl From<&CheckIn> for CheckInDocument {
    fn from(c: &CheckIn) -> Self {
        Self {
            id: c.id.to_string(),
            user_id: c.user_id.to_string(),
            gym_id: c.gym_id.to_string(),
            created_at: format_utc_rfc3339(c.created_at),
            validated_at: c.validated_at.map(format_utc_rfc3339),
            day: day_key(c.created_at),
        }
    }
}

impl TryFrom<CheckInDocument> for CheckIn {
    type Error = RepositoryError;

    fn try_from(doc: CheckInDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&doc.id)?,
            user_id: parse_uuid(&doc.user_id)?,
            gym_id: parse_uuid(&doc.gym_id)?,
            created_at: parse_timestamp(&doc.created_at)?,
            validated_at: doc
                .validated_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

/// Marker claiming a (user, day) slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DayMarker {
    check_in_id: String,
}

fn day_marker_id(user_id: Uuid, day: &str) -> String {
    format!("{}_{}", user_id, day)
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, RepositoryError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            RepositoryError::Backend(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, RepositoryError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            RepositoryError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    async fn get_check_in_doc(&self, id: &str) -> Result<Option<CheckIn>, RepositoryError> {
        let doc: Option<CheckInDocument> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::CHECK_INS)
            .obj()
            .one(id)
            .await
            .map_err(db_error)?;
        doc.map(CheckIn::try_from).transpose()
    }
}

// ─── Users ───────────────────────────────────────────────────

#[async_trait]
impl UsersRepository for FirestoreDb {
    async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: Utc::now(),
        };

        let doc = UserDocument::from(&user);
        let marker_id = urlencoding::encode(&user.email).into_owned();

        let outcome = self
            .client
            .run_transaction(|db, transaction| {
                let doc = doc.clone();
                let marker_id = marker_id.clone();
                Box::pin(async move {
                    let claimed: Option<EmailMarker> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USER_EMAILS)
                        .obj()
                        .one(&marker_id)
                        .await?;
                    if claimed.is_some() {
                        return Ok(TxOutcome::Conflict);
                    }

                    let marker = EmailMarker {
                        user_id: doc.id.clone(),
                    };
                    db.fluent()
                        .update()
                        .in_col(collections::USER_EMAILS)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&marker_id)
                        .object(&marker)
                        .add_to_transaction(&mut *transaction)?;
                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&doc.id)
                        .object(&doc)
                        .add_to_transaction(&mut *transaction)?;

                    TxResult::Ok(TxOutcome::Written)
                })
            })
            .await
            .map_err(db_error)?;

        if !matches!(outcome, TxOutcome::Written) {
            return Err(RepositoryError::Conflict(format!(
                "Email {} already registered",
                user.email
            )));
        }

        tracing::info!(user_id = %user.id, "User stored");
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let doc: Option<UserDocument> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(db_error)?;
        doc.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = email.to_string();
        let docs: Vec<UserDocument> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(db_error)?;
        docs.into_iter().next().map(User::try_from).transpose()
    }
}

// ─── Gyms ────────────────────────────────────────────────────

#[async_trait]
impl GymsRepository for FirestoreDb {
    async fn create(&self, new: NewGym) -> Result<Gym, RepositoryError> {
        let gym = Gym {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            phone: new.phone,
            latitude: new.latitude,
            longitude: new.longitude,
        };

        let doc = GymDocument {
            id: gym.id.to_string(),
            title: gym.title.clone(),
            description: gym.description.clone(),
            phone: gym.phone.clone(),
            latitude: gym.latitude,
            longitude: gym.longitude,
            created_at: format_utc_rfc3339(Utc::now()),
        };

        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collections::GYMS)
            .document_id(&doc.id)
            .object(&doc)
            .execute()
            .await
            .map_err(db_error)?;

        Ok(gym)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Gym>, RepositoryError> {
        let doc: Option<GymDocument> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::GYMS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(db_error)?;
        doc.map(Gym::try_from).transpose()
    }

    /// Firestore has no substring operator, so titles are matched while
    /// streaming the collection in creation order.
    async fn search_many(&self, query: &str, page: u32) -> Result<Vec<Gym>, RepositoryError> {
        let query = query.to_string();
        let stream = self
            .client
            .fluent()
            .select()
            .from(collections::GYMS)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj::<GymDocument>()
            .stream_query_with_errors()
            .await
            .map_err(db_error)?;

        let docs: Vec<GymDocument> = stream
            .try_filter(move |doc| future::ready(doc.title.contains(&query)))
            .skip(page_offset(page))
            .take(PAGE_SIZE)
            .try_collect()
            .await
            .map_err(db_error)?;

        docs.into_iter().map(Gym::try_from).collect()
    }

    async fn find_many_nearby(&self, origin: Coordinate) -> Result<Vec<Gym>, RepositoryError> {
        let bbox = bounding_box(origin, NEARBY_RADIUS_KM);
        let (min_lat, max_lat) = (bbox.min().y, bbox.max().y);

        // Range-filter on latitude, then apply the exact radius check
        let docs: Vec<GymDocument> = self
            .client
            .fluent()
            .select()
            .from(collections::GYMS)
            .filter(move |q| {
                q.for_all([
                    q.field("latitude").greater_than_or_equal(min_lat),
                    q.field("latitude").less_than_or_equal(max_lat),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(db_error)?;

        docs.into_iter()
            .map(Gym::try_from)
            .filter(|gym| match gym {
                Ok(g) => distance_km(origin, g.location()) <= NEARBY_RADIUS_KM,
                Err(_) => true,
            })
            .collect()
    }
}

// ─── Check-ins ───────────────────────────────────────────────

#[async_trait]
impl CheckInsRepository for FirestoreDb {
    async fn create(&self, new: NewCheckIn) -> Result<CheckIn, RepositoryError> {
        let check_in = CheckIn {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            gym_id: new.gym_id,
            created_at: new.created_at,
            validated_at: None,
        };
        let doc = CheckInDocument::from(&check_in);
        let marker_id = day_marker_id(check_in.user_id, &doc.day);

        // Marker and record commit together, so no marker is ever orphaned
        let outcome = self
            .client
            .run_transaction(|db, transaction| {
                let doc = doc.clone();
                let marker_id = marker_id.clone();
                Box::pin(async move {
                    let claimed: Option<DayMarker> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::CHECK_IN_DAYS)
                        .obj()
                        .one(&marker_id)
                        .await?;
                    if claimed.is_some() {
                        return Ok(TxOutcome::Conflict);
                    }

                    let marker = DayMarker {
                        check_in_id: doc.id.clone(),
                    };
                    db.fluent()
                        .update()
                        .in_col(collections::CHECK_IN_DAYS)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&marker_id)
                        .object(&marker)
                        .add_to_transaction(&mut *transaction)?;
                    db.fluent()
                        .update()
                        .in_col(collections::CHECK_INS)
                        .document_id(&doc.id)
                        .object(&doc)
                        .add_to_transaction(&mut *transaction)?;

                    TxResult::Ok(TxOutcome::Written)
                })
            })
            .await
            .map_err(db_error)?;

        match outcome {
            TxOutcome::Written => Ok(check_in),
            _ => Err(RepositoryError::Conflict(format!(
                "User {} already checked in on {}",
                check_in.user_id, doc.day
            ))),
        }
    }

    async fn save(&self, check_in: &CheckIn) -> Result<CheckIn, RepositoryError> {
        let doc = CheckInDocument::from(check_in);

        // Read and write in one transaction; a racing validator is retried
        // against the committed value and hits the write-once rule.
        let outcome = self
            .client
            .run_transaction(|db, transaction| {
                let doc = doc.clone();
                Box::pin(async move {
                    let stored: Option<CheckInDocument> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::CHECK_INS)
                        .obj()
                        .one(&doc.id)
                        .await?;
                    let Some(stored) = stored else {
                        return Ok(TxOutcome::Missing);
                    };
                    if stored.validated_at.is_some() && stored.validated_at != doc.validated_at {
                        return Ok(TxOutcome::Conflict);
                    }

                    db.fluent()
                        .update()
                        .in_col(collections::CHECK_INS)
                        .document_id(&doc.id)
                        .object(&doc)
                        .add_to_transaction(&mut *transaction)?;

                    TxResult::Ok(TxOutcome::Written)
                })
            })
            .await
            .map_err(db_error)?;

        match outcome {
            TxOutcome::Written => Ok(check_in.clone()),
            TxOutcome::Missing => Err(RepositoryError::Backend(format!(
                "Check-in {} not found",
                check_in.id
            ))),
            TxOutcome::Conflict => Err(RepositoryError::Conflict(format!(
                "Check-in {} already validated",
                check_in.id
            ))),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CheckIn>, RepositoryError> {
        self.get_check_in_doc(&id.to_string()).await
    }

    async fn find_by_user_on_date(
        &self,
        user_id: Uuid,
        date: DateTime<Utc>,
    ) -> Result<Option<CheckIn>, RepositoryError> {
        let marker: Option<DayMarker> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::CHECK_IN_DAYS)
            .obj()
            .one(&day_marker_id(user_id, &day_key(date)))
            .await
            .map_err(db_error)?;

        match marker {
            Some(m) => self.get_check_in_doc(&m.check_in_id).await,
            None => Ok(None),
        }
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let user_id = user_id.to_string();
        let docs: Vec<CheckInDocument> = self
            .client
            .fluent()
            .select()
            .from(collections::CHECK_INS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(db_error)?;
        Ok(docs.len() as u64)
    }

    async fn find_many_by_user(
        &self,
        user_id: Uuid,
        page: u32,
    ) -> Result<Vec<CheckIn>, RepositoryError> {
        // An offset past u32::MAX is past every stored record
        let Ok(offset) = u32::try_from(page_offset(page)) else {
            return Ok(Vec::new());
        };

        let user_id = user_id.to_string();
        let docs: Vec<CheckInDocument> = self
            .client
            .fluent()
            .select()
            .from(collections::CHECK_INS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .limit(PAGE_LIMIT)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(db_error)?;

        docs.into_iter().map(CheckIn::try_from).collect()
    }
}
