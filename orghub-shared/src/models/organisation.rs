/// Organisation model
///
/// An organisation is a tenant. Membership logic only needs lookup and
/// creation here; the rest of organisation CRUD lives outside this
/// service.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organisations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     display_name VARCHAR(255),
///     status VARCHAR(32) NOT NULL DEFAULT 'unverified',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Organisation (tenant)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organisation {
    /// Unique organisation ID
    pub id: Uuid,

    /// Short name used in invitation emails
    pub name: String,

    /// Optional public display name
    pub display_name: Option<String>,

    /// Verification/visibility status, managed outside this service
    pub status: String,

    /// When the organisation was created
    pub created_at: DateTime<Utc>,

    /// When the organisation was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an organisation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganisation {
    /// Short name
    pub name: String,

    /// Optional display name
    pub display_name: Option<String>,
}

impl Organisation {
    /// Creates an organisation
    pub async fn create(pool: &PgPool, data: CreateOrganisation) -> Result<Self, sqlx::Error> {
        let organisation = sqlx::query_as::<_, Organisation>(
            r#"
            INSERT INTO organisations (name, display_name)
            VALUES ($1, $2)
            RETURNING id, name, display_name, status, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.display_name)
        .fetch_one(pool)
        .await?;

        Ok(organisation)
    }

    /// Finds an organisation by ID
    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let organisation = sqlx::query_as::<_, Organisation>(
            r#"
            SELECT id, name, display_name, status, created_at, updated_at
            FROM organisations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(organisation)
    }
}
