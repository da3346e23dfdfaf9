//! Fixed-table schema
//!
//! Idempotent DDL for every table except the per-project user tables, which
//! the tenant-table manager creates at project creation time.

use shared_error::AppError;
use sqlx::PgPool;

const FIXED_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        environment TEXT NOT NULL DEFAULT 'production'
            CHECK (environment IN ('development', 'staging', 'production')),
        signing_secret TEXT NOT NULL,
        signing_algorithm TEXT NOT NULL DEFAULT 'HS256',
        access_token_ttl_seconds BIGINT NOT NULL DEFAULT 3600,
        refresh_token_ttl_seconds BIGINT NOT NULL DEFAULT 604800,
        enabled BOOLEAN NOT NULL DEFAULT TRUE,
        user_table_name TEXT NOT NULL DEFAULT '',
        site_url TEXT,
        redirect_allowlist JSONB NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (name, environment)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS refresh_tokens (
        id UUID PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        user_id UUID NOT NULL,
        token_hash TEXT NOT NULL UNIQUE,
        device_name TEXT,
        user_agent TEXT,
        ip_address TEXT,
        expires_at TIMESTAMPTZ NOT NULL,
        revoked BOOLEAN NOT NULL DEFAULT FALSE,
        revoked_at TIMESTAMPTZ,
        revoked_reason TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        last_used_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user
        ON refresh_tokens (project_id, user_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS single_use_tokens (
        id UUID PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        user_id UUID NOT NULL,
        email TEXT NOT NULL,
        token_hash TEXT NOT NULL,
        expires_at BIGINT NOT NULL,
        used_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (project_id, user_id, token_hash)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_attempts (
        id UUID PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        attempt_type TEXT NOT NULL
            CHECK (attempt_type IN ('login', 'register', 'password_reset', 'oauth', 'refresh')),
        email TEXT,
        ip_address TEXT,
        user_agent TEXT,
        success BOOLEAN NOT NULL,
        failure_reason TEXT,
        user_id UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_auth_attempts_window
        ON auth_attempts (project_id, success, created_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rate_limit_rules (
        id UUID PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        rule_type TEXT NOT NULL
            CHECK (rule_type IN ('per_ip', 'per_email', 'per_project')),
        window_seconds BIGINT NOT NULL,
        max_attempts BIGINT NOT NULL,
        action TEXT NOT NULL DEFAULT 'block'
            CHECK (action IN ('block', 'delay', 'captcha')),
        block_duration_seconds BIGINT NOT NULL,
        enabled BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (project_id, rule_type)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id UUID PRIMARY KEY,
        project_id TEXT REFERENCES projects(id) ON DELETE CASCADE,
        event_type TEXT NOT NULL,
        event_status TEXT NOT NULL DEFAULT 'success'
            CHECK (event_status IN ('success', 'failure', 'warning')),
        user_id UUID,
        admin_user_id UUID,
        ip_address TEXT,
        user_agent TEXT,
        event_data JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_audit_logs_project_created
        ON audit_logs (project_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admin_users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name TEXT,
        role TEXT NOT NULL DEFAULT 'viewer'
            CHECK (role IN ('super_admin', 'admin', 'viewer')),
        enabled BOOLEAN NOT NULL DEFAULT TRUE,
        last_login_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admin_sessions (
        id UUID PRIMARY KEY,
        admin_user_id UUID NOT NULL REFERENCES admin_users(id) ON DELETE CASCADE,
        token_hash TEXT NOT NULL UNIQUE,
        ip_address TEXT,
        user_agent TEXT,
        expires_at TIMESTAMPTZ NOT NULL,
        last_activity_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS oauth_provider_configs (
        id UUID PRIMARY KEY,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        provider_name TEXT NOT NULL
            CHECK (provider_name IN ('google', 'github', 'microsoft', 'apple', 'custom')),
        client_id TEXT NOT NULL,
        client_secret TEXT NOT NULL,
        authorization_url TEXT NOT NULL,
        token_url TEXT NOT NULL,
        userinfo_url TEXT NOT NULL,
        scopes JSONB NOT NULL DEFAULT '[]',
        additional_config JSONB,
        enabled BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (project_id, provider_name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS email_providers (
        id UUID PRIMARY KEY,
        provider_type TEXT NOT NULL
            CHECK (provider_type IN ('sendgrid', 'postmark', 'mailgun', 'resend', 'smtp')),
        config JSONB NOT NULL DEFAULT '{}',
        from_email TEXT NOT NULL,
        from_name TEXT,
        is_default BOOLEAN NOT NULL DEFAULT FALSE,
        is_fallback BOOLEAN NOT NULL DEFAULT FALSE,
        enabled BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS email_templates (
        id UUID PRIMARY KEY,
        project_id TEXT REFERENCES projects(id) ON DELETE CASCADE,
        template_type TEXT NOT NULL
            CHECK (template_type IN
                ('confirmation', 'password_reset', 'welcome', 'magic_link', 'email_change', 'otp')),
        subject TEXT NOT NULL,
        html_body TEXT NOT NULL,
        text_body TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_email_templates_project_type
        ON email_templates (COALESCE(project_id, ''), template_type)
    "#,
];

/// Shared trigger function maintaining `updated_at` on row updates; reused by
/// every dynamic user table
const UPDATED_AT_FUNCTION: &str = r#"
    CREATE OR REPLACE FUNCTION set_updated_at()
    RETURNS TRIGGER AS $$
    BEGIN
        NEW.updated_at = NOW();
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql
"#;

/// Create the fixed tables and helper functions if absent
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for ddl in FIXED_TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    sqlx::query(UPDATED_AT_FUNCTION).execute(pool).await?;

    tracing::info!("Database schema ensured");
    Ok(())
}
