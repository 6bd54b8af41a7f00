/// Membership model and database operations
///
/// A membership is the many-to-many User↔Organisation relation plus the
/// invitation workflow state. It is the core entity of this service.
///
/// # Lifecycle
///
/// Rows are created in `invited` status by the invitation issuer, or
/// directly in `active` status when an organisation is created (the
/// creator becomes its first admin) or when a global admin adds a
/// member. `invited → active` is the only forward transition and is
/// performed exactly once by invitation redemption. Removal is a soft
/// delete; the expiration sweeper soft-deletes rows still `invited`
/// past the retention window.
///
/// # Invariants
///
/// - At most one live (non-deleted) membership per
///   `(organisation_id, user_id)`, enforced by a partial unique index.
/// - An organisation with at least one active membership always retains
///   at least one active admin membership; see [`crate::roles`] for the
///   enforcement logic.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     organisation_id UUID NOT NULL REFERENCES organisations(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'user',
///     status membership_status NOT NULL DEFAULT 'invited',
///     is_home BOOLEAN NOT NULL DEFAULT FALSE,
///     deleted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a user within one organisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Regular member
    User,

    /// Organisation admin: may invite, change roles and remove members
    Admin,
}

/// Workflow state of a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Invitation issued, not yet redeemed
    Invited,

    /// Membership redeemed or created directly
    Active,
}

/// Membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Surrogate ID; invitation codes resolve to this
    pub id: Uuid,

    /// Organisation the membership belongs to
    pub organisation_id: Uuid,

    /// Member user
    pub user_id: Uuid,

    /// Role within the organisation
    pub role: MembershipRole,

    /// Workflow state
    pub status: MembershipStatus,

    /// Whether this is the user's home organisation
    pub is_home: bool,

    /// Soft-delete marker; live rows have `None`
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the membership was created
    pub created_at: DateTime<Utc>,

    /// When the membership was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Organisation ID
    pub organisation_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign
    pub role: MembershipRole,

    /// Initial workflow state
    pub status: MembershipStatus,

    /// Home-organisation flag
    pub is_home: bool,
}

const COLUMNS: &str = "id, organisation_id, user_id, role, status, is_home, \
                       deleted_at, created_at, updated_at";

impl Membership {
    /// True for a live (non-deleted) admin membership in active state
    pub fn is_active_admin(&self) -> bool {
        self.role == MembershipRole::Admin
            && self.status == MembershipStatus::Active
            && self.deleted_at.is_none()
    }

    /// Creates a new membership
    ///
    /// # Errors
    ///
    /// Returns an error if a live membership already exists for the
    /// `(organisation, user)` pair (partial unique index violation),
    /// the organisation or user does not exist, or the database fails.
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            INSERT INTO memberships (organisation_id, user_id, role, status, is_home)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(data.organisation_id)
        .bind(data.user_id)
        .bind(data.role)
        .bind(data.status)
        .bind(data.is_home)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds the live membership for an `(organisation, user)` pair
    ///
    /// Soft-deleted rows are never returned. A `Some` result therefore
    /// means the pair is already linked; the invitation issuer rejects
    /// on exactly that condition.
    pub async fn find(
        pool: &PgPool,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM memberships
            WHERE organisation_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        ))
        .bind(organisation_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Finds a live membership by its surrogate ID
    ///
    /// Used by invitation redemption, which stores the surrogate ID in
    /// the ephemeral code store.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM memberships
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Lists all live memberships of an organisation
    ///
    /// Role changes load the full list once and derive the admin count,
    /// the caller's admin check and the target row from it.
    pub async fn list_for_organisation(
        pool: &PgPool,
        organisation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM memberships
            WHERE organisation_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        ))
        .bind(organisation_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Updates the role of a live membership
    pub async fn update_role(
        pool: &PgPool,
        id: Uuid,
        role: MembershipRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET role = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Updates the workflow state of a live membership
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: MembershipStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Soft-deletes a membership
    ///
    /// Returns true if a live row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE memberships
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-deletes invitations older than the cutoff
    ///
    /// The predicate is age-based, so a missed sweeper run is naturally
    /// re-covered by the next one. Returns the number of purged rows.
    pub async fn purge_expired_invitations(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE memberships
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE status = 'invited' AND deleted_at IS NULL AND created_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
