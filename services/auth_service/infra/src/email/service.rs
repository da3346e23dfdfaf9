use async_trait::async_trait;
use shared_error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use auth_service_core::domains::email::{
    domain::{
        model::{EmailMessage, EmailProvider},
        repository::{EmailProviderRepository, EmailTemplateRepository},
        service::{EmailService, Mailer},
    },
    template::render_template,
};
use auth_service_core::domains::project::domain::model::Project;

use super::transport::ProviderTransport;

/// Email orchestration implementation
///
/// Provider pick: default, else fallback. Template pick: per-project
/// override, else system default. Every failure collapses to
/// `EmailSendFailed`; auth-flow callers log and continue.
pub struct EmailServiceImpl<PR, TR>
where
    PR: EmailProviderRepository,
    TR: EmailTemplateRepository,
{
    provider_repo: Arc<PR>,
    template_repo: Arc<TR>,
    outbound_timeout: Duration,
}

impl<PR, TR> EmailServiceImpl<PR, TR>
where
    PR: EmailProviderRepository,
    TR: EmailTemplateRepository,
{
    pub fn new(
        provider_repo: Arc<PR>,
        template_repo: Arc<TR>,
        outbound_timeout: Duration,
    ) -> Self {
        Self {
            provider_repo,
            template_repo,
            outbound_timeout,
        }
    }

    async fn pick_provider(&self) -> Result<EmailProvider, AppError> {
        if let Some(provider) = self.provider_repo.find_default().await? {
            return Ok(provider);
        }
        if let Some(provider) = self.provider_repo.find_fallback().await? {
            tracing::warn!("No default email provider, using fallback");
            return Ok(provider);
        }
        Err(AppError::EmailSendFailed("No email provider configured".to_string()))
    }
}

#[async_trait]
impl<PR, TR> EmailService for EmailServiceImpl<PR, TR>
where
    PR: EmailProviderRepository + Send + Sync,
    TR: EmailTemplateRepository + Send + Sync,
{
    async fn send_templated(
        &self,
        project: &Project,
        template_type: &str,
        to: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), AppError> {
        let provider = self.pick_provider().await?;

        let template = self
            .template_repo
            .find_for_project(&project.id, template_type)
            .await?
            .ok_or_else(|| {
                AppError::EmailSendFailed(format!("No template for '{}'", template_type))
            })?;

        let message = EmailMessage {
            to: to.to_string(),
            from: provider.from_email.clone(),
            from_name: provider.from_name.clone(),
            subject: render_template(&template.subject, values),
            html: render_template(&template.html_body, values),
            text: template
                .text_body
                .as_ref()
                .map(|body| render_template(body, values)),
        };

        let transport = ProviderTransport::from_provider(&provider, self.outbound_timeout)
            .map_err(|e| AppError::EmailSendFailed(e.to_string()))?;
        transport.send(&message).await?;

        tracing::info!(
            to = %to,
            template = %template_type,
            provider = %provider.provider_type,
            "Email dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_service_core::domains::email::domain::model::EmailTemplate;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct FakeProviders(Option<EmailProvider>, Option<EmailProvider>);

    #[async_trait]
    impl EmailProviderRepository for FakeProviders {
        async fn create(&self, p: &EmailProvider) -> Result<EmailProvider, AppError> {
            Ok(p.clone())
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<EmailProvider>, AppError> {
            Ok(None)
        }
        async fn find_default(&self) -> Result<Option<EmailProvider>, AppError> {
            Ok(self.0.clone())
        }
        async fn find_fallback(&self) -> Result<Option<EmailProvider>, AppError> {
            Ok(self.1.clone())
        }
        async fn list(&self) -> Result<Vec<EmailProvider>, AppError> {
            Ok(vec![])
        }
        async fn update(&self, p: &EmailProvider) -> Result<EmailProvider, AppError> {
            Ok(p.clone())
        }
        async fn delete(&self, _id: Uuid) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    struct FakeTemplates(Mutex<Vec<EmailTemplate>>);

    #[async_trait]
    impl EmailTemplateRepository for FakeTemplates {
        async fn find_for_project(
            &self,
            project_id: &str,
            template_type: &str,
        ) -> Result<Option<EmailTemplate>, AppError> {
            let templates = self.0.lock().unwrap();
            let matching = templates
                .iter()
                .find(|t| {
                    t.template_type == template_type
                        && t.project_id.as_deref() == Some(project_id)
                })
                .or_else(|| {
                    templates
                        .iter()
                        .find(|t| t.template_type == template_type && t.project_id.is_none())
                });
            Ok(matching.cloned())
        }

        async fn upsert(&self, t: &EmailTemplate) -> Result<EmailTemplate, AppError> {
            self.0.lock().unwrap().push(t.clone());
            Ok(t.clone())
        }

        async fn list_for_project(&self, _p: &str) -> Result<Vec<EmailTemplate>, AppError> {
            Ok(vec![])
        }

        async fn list_system(&self) -> Result<Vec<EmailTemplate>, AppError> {
            Ok(vec![])
        }

        async fn delete(&self, _id: Uuid) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    fn template(project_id: Option<&str>, subject: &str) -> EmailTemplate {
        EmailTemplate {
            id: Uuid::new_v4(),
            project_id: project_id.map(String::from),
            template_type: "confirmation".into(),
            subject: subject.into(),
            html_body: "<p>Hello {{display_name}}</p>".into(),
            text_body: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_project() -> Project {
        let now = Utc::now();
        Project {
            id: "acme".into(),
            name: "Acme".into(),
            description: None,
            environment: "development".into(),
            signing_secret: "c2VjcmV0".into(),
            signing_algorithm: "HS256".into(),
            access_token_ttl_seconds: 3600,
            refresh_token_ttl_seconds: 604_800,
            enabled: true,
            user_table_name: "acme_users".into(),
            site_url: None,
            redirect_allowlist: sqlx::types::Json(vec![]),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_no_provider_is_send_failed() {
        let service = EmailServiceImpl::new(
            Arc::new(FakeProviders(None, None)),
            Arc::new(FakeTemplates(Mutex::new(vec![template(None, "Hi")]))),
            Duration::from_secs(10),
        );

        let err = service
            .send_templated(&test_project(), "confirmation", "u@x.com", &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailSendFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_template_is_send_failed() {
        let provider = EmailProvider {
            id: Uuid::new_v4(),
            provider_type: "sendgrid".into(),
            config: sqlx::types::Json(serde_json::json!({"api_key": "k"})),
            from_email: "noreply@example.com".into(),
            from_name: None,
            is_default: true,
            is_fallback: false,
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let service = EmailServiceImpl::new(
            Arc::new(FakeProviders(Some(provider), None)),
            Arc::new(FakeTemplates(Mutex::new(vec![]))),
            Duration::from_secs(10),
        );

        let err = service
            .send_templated(&test_project(), "confirmation", "u@x.com", &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailSendFailed(_)));
    }

    #[tokio::test]
    async fn test_project_template_shadows_system() {
        let templates = FakeTemplates(Mutex::new(vec![
            template(None, "System subject"),
            template(Some("acme"), "Project subject"),
        ]));

        let found = templates
            .find_for_project("acme", "confirmation")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.subject, "Project subject");

        let found = templates
            .find_for_project("other", "confirmation")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.subject, "System subject");
    }
}
