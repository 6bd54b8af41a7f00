/// Audit trail of handled requests
///
/// One row is recorded per handled invitation/member request, after the
/// outcome is known: the operation kind, the acting user (when the
/// request was authenticated) and the final error, if any. Recording is
/// best-effort and never fails the request it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kinds of audited operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    CreateInvitation,
    GetInvitations,
    DeleteInvitation,
    AcceptInvitation,
    GetOrganisationUsers,
    AddOrganisationUser,
    ChangeOrganisationUser,
    DeleteOrganisationUser,
}

impl ActivityKind {
    /// Stable string stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::CreateInvitation => "create_invitation",
            ActivityKind::GetInvitations => "get_invitations",
            ActivityKind::DeleteInvitation => "delete_invitation",
            ActivityKind::AcceptInvitation => "accept_invitation",
            ActivityKind::GetOrganisationUsers => "get_organisation_users",
            ActivityKind::AddOrganisationUser => "add_organisation_user",
            ActivityKind::ChangeOrganisationUser => "change_organisation_user",
            ActivityKind::DeleteOrganisationUser => "delete_organisation_user",
        }
    }
}

/// Audit record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    /// Unique record ID
    pub id: Uuid,

    /// Acting user, if the request carried a session
    pub user_id: Option<Uuid>,

    /// Operation kind
    pub kind: String,

    /// Final error of the request, if it failed
    pub error: Option<String>,

    /// When the record was written
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Inserts an audit record
    pub async fn record(
        pool: &PgPool,
        kind: ActivityKind,
        user_id: Option<Uuid>,
        error: Option<String>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO activities (user_id, kind, error)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }
}
