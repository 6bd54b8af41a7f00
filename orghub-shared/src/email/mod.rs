/// Transactional email dispatch
///
/// Invitation emails are best-effort: by the time one is sent, both the
/// membership and the invitation code already exist, so a delivery
/// failure must never surface to the caller. Handlers enqueue a job on
/// a bounded channel and move on; a single worker task drains the
/// channel and talks to the email provider, logging failures.
///
/// # Example
///
/// ```no_run
/// use orghub_shared::email::{EmailClient, EmailConfig, EmailJob, EmailTemplate, Mailer};
/// use std::collections::HashMap;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = EmailConfig::from_env()?;
/// let mailer = Mailer::spawn(EmailClient::new(config));
///
/// mailer.enqueue(EmailJob {
///     template: EmailTemplate::Invitation,
///     recipient: "invitee@example.com".to_string(),
///     variables: HashMap::new(),
/// });
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

/// Queue depth before enqueue starts dropping jobs
const QUEUE_CAPACITY: usize = 256;

/// Per-send timeout so a hung provider can't wedge the worker
const SEND_TIMEOUT_SECS: u64 = 30;

/// Email dispatch errors
#[derive(Debug, Error)]
pub enum EmailError {
    /// Configuration error
    #[error("Email configuration error: {0}")]
    ConfigError(String),

    /// Provider request failed
    #[error("Email provider error: {0}")]
    ProviderError(String),
}

/// Email provider configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Provider endpoint URL
    pub api_url: String,

    /// Provider API key
    pub api_key: String,

    /// Sender address
    pub sender: String,
}

impl EmailConfig {
    /// Loads email configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `EMAIL_API_URL`: provider endpoint (required)
    /// - `EMAIL_API_KEY`: provider API key (required)
    /// - `EMAIL_SENDER`: sender address (default: no-reply@orghub.dev)
    pub fn from_env() -> Result<Self, EmailError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("EMAIL_API_URL").map_err(|_| {
            EmailError::ConfigError("EMAIL_API_URL environment variable is required".to_string())
        })?;
        let api_key = env::var("EMAIL_API_KEY").map_err(|_| {
            EmailError::ConfigError("EMAIL_API_KEY environment variable is required".to_string())
        })?;
        let sender =
            env::var("EMAIL_SENDER").unwrap_or_else(|_| "no-reply@orghub.dev".to_string());

        Ok(Self {
            api_url,
            api_key,
            sender,
        })
    }
}

/// Template identifiers known to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    /// Organisation invitation with accept link
    Invitation,
}

/// One email to send
#[derive(Debug, Clone)]
pub struct EmailJob {
    /// Template to render
    pub template: EmailTemplate,

    /// Recipient address
    pub recipient: String,

    /// Template variables (ACCEPT_URL, INVITER_NAME, ...)
    pub variables: HashMap<String, String>,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    template: EmailTemplate,
    from: &'a str,
    to: &'a str,
    variables: &'a HashMap<String, String>,
}

/// HTTP client for the transactional email provider
#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    config: EmailConfig,
}

impl EmailClient {
    /// Creates a provider client
    pub fn new(config: EmailConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self { http, config }
    }

    /// Sends one templated email through the provider
    pub async fn send(&self, job: &EmailJob) -> Result<(), EmailError> {
        let body = SendRequest {
            template: job.template,
            from: &self.config.sender,
            to: &job.recipient,
            variables: &job.variables,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::ProviderError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EmailError::ProviderError(format!(
                "Provider returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Handle to the background email worker
///
/// Cloneable; all clones feed the same bounded queue.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<EmailJob>,
}

impl Mailer {
    /// Spawns the worker task and returns the queue handle
    pub fn spawn(client: EmailClient) -> Self {
        let (tx, mut rx) = mpsc::channel::<EmailJob>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = client.send(&job).await {
                    tracing::warn!(
                        recipient = %job.recipient,
                        template = ?job.template,
                        "Email delivery failed: {}",
                        e
                    );
                }
            }
            tracing::debug!("Email worker exiting: queue closed");
        });

        Self { tx }
    }

    /// Enqueues an email without blocking
    ///
    /// A full or closed queue drops the job with a log line; the caller
    /// already succeeded and must not observe the failure.
    pub fn enqueue(&self, job: EmailJob) {
        if let Err(e) = self.tx.try_send(job) {
            tracing::warn!("Dropping email job: {}", e);
        }
    }
}
