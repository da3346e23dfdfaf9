use async_trait::async_trait;
use shared_error::AppError;
use std::collections::HashMap;

use super::model::EmailMessage;
use crate::domains::project::domain::model::Project;

/// Mail transport capability
///
/// Implemented by each provider variant; the orchestration layer picks the
/// provider and renders the template, transports only deliver.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

/// Email orchestration
///
/// Picks the default provider (falling back to the fallback provider),
/// resolves the template (per-project override, then system default),
/// renders `{{key}}` placeholders and dispatches. All failures surface as
/// `EmailSendFailed`; callers in auth flows log and continue.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_templated(
        &self,
        project: &Project,
        template_type: &str,
        to: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), AppError>;
}
