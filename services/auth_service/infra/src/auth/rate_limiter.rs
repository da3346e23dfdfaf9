use async_trait::async_trait;
use auth_service_core::domains::auth::domain::{
    model::AuthAttempt,
    rate_limiter::RateLimiter,
    repository::AuthAttemptRepository,
};
use auth_service_core::domains::project::domain::repository::RateLimitRuleRepository;
use shared_error::AppError;
use std::sync::Arc;

/// Database-backed rate limiter
///
/// For each enabled rule of the project, counts failed attempts inside the
/// rule's window (scoped per_ip / per_email / per_project) and fails with
/// `RateLimited` carrying the rule's block duration once the count reaches
/// the maximum. Successful attempts are recorded but never counted.
pub struct DbRateLimiter<AR, RR>
where
    AR: AuthAttemptRepository,
    RR: RateLimitRuleRepository,
{
    attempt_repo: Arc<AR>,
    rule_repo: Arc<RR>,
}

impl<AR, RR> DbRateLimiter<AR, RR>
where
    AR: AuthAttemptRepository,
    RR: RateLimitRuleRepository,
{
    pub fn new(attempt_repo: Arc<AR>, rule_repo: Arc<RR>) -> Self {
        Self {
            attempt_repo,
            rule_repo,
        }
    }
}

#[async_trait]
impl<AR, RR> RateLimiter for DbRateLimiter<AR, RR>
where
    AR: AuthAttemptRepository + Send + Sync,
    RR: RateLimitRuleRepository + Send + Sync,
{
    async fn check(
        &self,
        project_id: &str,
        ip_address: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), AppError> {
        let rules = self.rule_repo.list_enabled(project_id).await?;

        for rule in rules {
            let (scope_ip, scope_email) = match rule.rule_type.as_str() {
                "per_ip" => {
                    if ip_address.is_none() {
                        continue;
                    }
                    (ip_address, None)
                },
                "per_email" => {
                    if email.is_none() {
                        continue;
                    }
                    (None, email)
                },
                "per_project" => (None, None),
                other => {
                    tracing::warn!(rule_type = %other, "Skipping unknown rate-limit rule type");
                    continue;
                },
            };

            let count = self
                .attempt_repo
                .count_recent_failures(project_id, rule.window_seconds, scope_ip, scope_email)
                .await?;

            if count >= rule.max_attempts {
                if rule.action != "block" {
                    // delay/captcha are configuration placeholders; enforced as block
                    tracing::debug!(
                        project_id = %project_id,
                        rule_type = %rule.rule_type,
                        action = %rule.action,
                        "Unenforced rule action treated as block"
                    );
                }
                tracing::warn!(
                    project_id = %project_id,
                    rule_type = %rule.rule_type,
                    count = %count,
                    max = %rule.max_attempts,
                    "Rate limit tripped"
                );
                return Err(AppError::RateLimited {
                    retry_after_seconds: rule.block_duration_seconds,
                });
            }
        }

        Ok(())
    }

    async fn record(&self, attempt: &AuthAttempt) -> Result<(), AppError> {
        self.attempt_repo.record(attempt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_service_core::domains::project::domain::model::RateLimitRule;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Fake attempt repo with a programmable failure count; records the
    /// scope of every count query for assertions
    struct FakeAttempts {
        count: i64,
        queries: Mutex<Vec<(i64, Option<String>, Option<String>)>>,
    }

    impl FakeAttempts {
        fn with_count(count: i64) -> Self {
            Self {
                count,
                queries: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl AuthAttemptRepository for FakeAttempts {
        async fn record(&self, _attempt: &AuthAttempt) -> Result<(), AppError> {
            Ok(())
        }

        async fn count_recent_failures(
            &self,
            _project_id: &str,
            window_seconds: i64,
            ip_address: Option<&str>,
            email: Option<&str>,
        ) -> Result<i64, AppError> {
            self.queries.lock().unwrap().push((
                window_seconds,
                ip_address.map(String::from),
                email.map(String::from),
            ));
            Ok(self.count)
        }
    }

    struct FakeRules(Vec<RateLimitRule>);

    #[async_trait]
    impl RateLimitRuleRepository for FakeRules {
        async fn insert(&self, rule: &RateLimitRule) -> Result<RateLimitRule, AppError> {
            Ok(rule.clone())
        }

        async fn list(&self, _project_id: &str) -> Result<Vec<RateLimitRule>, AppError> {
            Ok(self.0.clone())
        }

        async fn list_enabled(&self, _project_id: &str) -> Result<Vec<RateLimitRule>, AppError> {
            Ok(self.0.clone())
        }

        async fn find(
            &self,
            _project_id: &str,
            rule_type: &str,
        ) -> Result<Option<RateLimitRule>, AppError> {
            Ok(self.0.iter().find(|r| r.rule_type == rule_type).cloned())
        }

        async fn upsert(&self, rule: &RateLimitRule) -> Result<RateLimitRule, AppError> {
            Ok(rule.clone())
        }

        async fn delete(&self, _id: Uuid) -> Result<bool, AppError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_under_limit_passes() {
        let rules = FakeRules(vec![RateLimitRule::default_per_ip("acme")]);
        let attempts = Arc::new(FakeAttempts::with_count(4));

        let limiter = DbRateLimiter::new(attempts, Arc::new(rules));
        assert!(limiter.check("acme", Some("203.0.113.1"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_at_limit_blocks_with_rule_duration() {
        let rules = FakeRules(vec![RateLimitRule::default_per_ip("acme")]);
        let attempts = Arc::new(FakeAttempts::with_count(5));

        let limiter = DbRateLimiter::new(attempts, Arc::new(rules));
        let err = limiter
            .check("acme", Some("203.0.113.1"), None)
            .await
            .unwrap_err();
        match err {
            AppError::RateLimited { retry_after_seconds } => {
                assert_eq!(retry_after_seconds, 300)
            },
            other => panic!("expected RateLimited, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_per_ip_rule_skipped_without_ip() {
        let rules = FakeRules(vec![RateLimitRule::default_per_ip("acme")]);
        let attempts = Arc::new(FakeAttempts::with_count(100));

        let limiter = DbRateLimiter::new(attempts.clone(), Arc::new(rules));
        assert!(limiter.check("acme", None, None).await.is_ok());
        assert!(attempts.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_per_email_rule_uses_email_scope() {
        let rules = FakeRules(vec![RateLimitRule::default_per_email("acme")]);
        let attempts = Arc::new(FakeAttempts::with_count(3));

        let limiter = DbRateLimiter::new(attempts.clone(), Arc::new(rules));
        let err = limiter
            .check("acme", Some("203.0.113.1"), Some("a@x.com"))
            .await
            .unwrap_err();
        match err {
            AppError::RateLimited { retry_after_seconds } => {
                assert_eq!(retry_after_seconds, 900)
            },
            other => panic!("expected RateLimited, got {other}"),
        }

        let queries = attempts.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        let (window, ip, email) = &queries[0];
        assert_eq!(*window, 300);
        assert!(ip.is_none());
        assert_eq!(email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn test_per_project_rule_counts_unscoped() {
        let mut rule = RateLimitRule::default_per_ip("acme");
        rule.rule_type = "per_project".to_string();
        rule.max_attempts = 10;
        let rules = FakeRules(vec![rule]);
        let attempts = Arc::new(FakeAttempts::with_count(2));

        let limiter = DbRateLimiter::new(attempts.clone(), Arc::new(rules));
        assert!(limiter.check("acme", None, None).await.is_ok());

        let queries = attempts.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].1.is_none());
        assert!(queries[0].2.is_none());
    }
}
