/// User model and database operations
///
/// Users are created directly (sign-up) or implicitly when invited into
/// an organisation by email. They carry two orthogonal states:
///
/// - `status`: whether the email address has been proven. Accepting an
///   invitation counts as proof and flips `unverified` to `verified`.
/// - `role`: the global, system-level role. Global admins bypass the
///   per-organisation permission checks in a few places (direct member
///   add/remove).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     name VARCHAR(255),
///     last_name VARCHAR(255),
///     phone_country_code VARCHAR(8),
///     phone_number VARCHAR(32),
///     status user_status NOT NULL DEFAULT 'unverified',
///     role user_role NOT NULL DEFAULT 'user',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Email verification state of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Email address not yet proven
    Unverified,

    /// Email address verified (directly or by accepting an invitation)
    Verified,
}

/// Global, system-level role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user; permissions come from organisation memberships
    User,

    /// Platform operator; may manage members of any organisation
    Admin,
}

impl UserRole {
    /// True for platform operators
    pub fn is_global_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (case-insensitive via CITEXT, unique)
    pub email: String,

    /// First name
    pub name: Option<String>,

    /// Last name
    pub last_name: Option<String>,

    /// Phone country code, e.g. "+41"
    pub phone_country_code: Option<String>,

    /// Phone number without country code
    pub phone_number: Option<String>,

    /// Email verification state
    pub status: UserStatus,

    /// Global role
    pub role: UserRole,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// New users always start `unverified` with the global `user` role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// First name
    pub name: Option<String>,

    /// Last name
    pub last_name: Option<String>,

    /// Phone country code
    pub phone_country_code: Option<String>,

    /// Phone number
    pub phone_number: Option<String>,
}

impl User {
    /// Creates a new user account
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint)
    /// or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, last_name, phone_country_code, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, name, last_name, phone_country_code, phone_number,
                      status, role, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.last_name)
        .bind(data.phone_country_code)
        .bind(data.phone_number)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, last_name, phone_country_code, phone_number,
                   status, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Email comparison is case-insensitive (CITEXT column).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, last_name, phone_country_code, phone_number,
                   status, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Marks a user's email as verified
    ///
    /// Idempotent; verifying an already verified user is a no-op update.
    pub async fn mark_verified(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET status = 'verified', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Lists users belonging to an organisation through live memberships
    ///
    /// With `invited_only` set, returns only users whose membership is
    /// still pending; otherwise returns active members.
    pub async fn list_for_organisation(
        pool: &PgPool,
        organisation_id: Uuid,
        invited_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let status = if invited_only { "invited" } else { "active" };

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.name, u.last_name, u.phone_country_code, u.phone_number,
                   u.status, u.role, u.created_at, u.updated_at
            FROM users u
            JOIN memberships m ON m.user_id = u.id
            WHERE m.organisation_id = $1
              AND m.status = $2::membership_status
              AND m.deleted_at IS NULL
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(organisation_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
