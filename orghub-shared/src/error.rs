/// Membership error taxonomy
///
/// Domain errors shared by the API server and worker. The API maps
/// each variant to an HTTP status in its own error type; everything
/// below stays transport-agnostic.
///
/// # Variants
///
/// | Variant          | Meaning                                        |
/// |------------------|------------------------------------------------|
/// | NotFound         | Entity or invitation does not exist            |
/// | AlreadyExists    | Live membership already links the pair         |
/// | AlreadyAccepted  | Invitation was redeemed before                 |
/// | AccessForbidden  | Caller lacks the required role                 |
/// | InvalidField     | A request field failed a semantic check        |
/// | Upstream         | Database or store failure                      |

use thiserror::Error;

/// Result alias for membership operations
pub type MembershipResult<T> = Result<T, MembershipError>;

/// Domain errors for membership and invitation operations
#[derive(Debug, Error)]
pub enum MembershipError {
    /// Entity not found
    #[error("{0}")]
    NotFound(String),

    /// A live membership already links the organisation and user
    #[error("{0}")]
    AlreadyExists(String),

    /// The invitation was already redeemed
    #[error("Invitation already accepted")]
    AlreadyAccepted,

    /// Caller lacks the required permission
    #[error("{0}")]
    AccessForbidden(String),

    /// A request field failed a semantic check
    #[error("{field}: {message}")]
    InvalidField {
        /// Offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Database or store failure
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl MembershipError {
    /// Builds an `InvalidField` error
    pub fn invalid_field(field: &str, message: &str) -> Self {
        MembershipError::InvalidField {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<sqlx::Error> for MembershipError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                MembershipError::NotFound("Resource not found".to_string())
            }
            other => MembershipError::Upstream(other.to_string()),
        }
    }
}
