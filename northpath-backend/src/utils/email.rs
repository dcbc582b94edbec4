// northpath-backend/src/utils/email.rs

use crate::error::{AppError, AppResult};
use crate::utils::validation::{escape_html, is_valid_email, mask_email};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::env;
use thiserror::Error;
use tracing::{error, info};

/// メール送信エラー
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("SMTP configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to send email: {0}")]
    SendError(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Missing email configuration")]
    MissingConfiguration,
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::InvalidAddress(address) => {
                AppError::ValidationError(format!("Invalid email address: {}", address))
            }
            other => AppError::ExternalServiceError(other.to_string()),
        }
    }
}

/// メール設定
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    /// STARTTLS を使用するか
    pub use_tls: bool,
    /// 開発モードかどうか（ログ出力のみ）
    pub development_mode: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@northpathstrategies.org".to_string(),
            from_name: "NorthPath Strategies".to_string(),
            use_tls: true,
            development_mode: true,
        }
    }
}

impl EmailConfig {
    /// 環境変数から設定を読み込み
    pub fn from_env() -> Result<Self, EmailError> {
        let development_mode = env::var("EMAIL_DEVELOPMENT_MODE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        if development_mode {
            return Ok(Self::default());
        }

        let smtp_host = env::var("SMTP_HOST").map_err(|_| EmailError::MissingConfiguration)?;
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .map_err(|_| EmailError::ConfigurationError("Invalid SMTP port".to_string()))?;
        let smtp_username =
            env::var("SMTP_USERNAME").map_err(|_| EmailError::MissingConfiguration)?;
        let smtp_password =
            env::var("SMTP_PASSWORD").map_err(|_| EmailError::MissingConfiguration)?;
        let from_email = env::var("SMTP_FROM_EMAIL")
            .or_else(|_| env::var("FROM_EMAIL"))
            .map_err(|_| EmailError::MissingConfiguration)?;
        let from_name =
            env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "NorthPath Strategies".to_string());
        let use_tls = env::var("SMTP_USE_TLS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_email,
            from_name,
            use_tls,
            development_mode: false,
        })
    }

    /// 設定の検証
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.development_mode {
            return Ok(());
        }

        if self.smtp_host.is_empty() {
            return Err(EmailError::ConfigurationError(
                "SMTP host is required".to_string(),
            ));
        }

        if !is_valid_email(&self.from_email) {
            return Err(EmailError::InvalidAddress(self.from_email.clone()));
        }

        Ok(())
    }
}

/// 件名と本文
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    pub name: &'static str,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// メール送信内容
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl EmailMessage {
    pub fn from_template(to_email: &str, to_name: Option<&str>, template: EmailTemplate) -> Self {
        Self {
            to_email: to_email.to_string(),
            to_name: to_name.map(str::to_string),
            subject: template.subject,
            html_body: template.html_body,
            text_body: template.text_body,
        }
    }
}

/// 新規アセスメント通知の内容
#[derive(Debug, Clone)]
pub struct SubmissionSummary<'a> {
    pub assessment_id: &'a str,
    pub institution_name: &'a str,
    pub organization_type: &'a str,
    pub tier: &'a str,
    pub tier_name: &'a str,
    pub contact_name: &'a str,
    pub contact_email: &'a str,
    pub response_count: usize,
}

/// メール送信サービス
pub struct EmailService {
    config: EmailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    frontend_url: String,
}

impl EmailService {
    pub fn new(config: EmailConfig, frontend_url: &str) -> Result<Self, EmailError> {
        config.validate()?;

        let transport = if config.development_mode {
            None
        } else {
            let builder = if config.use_tls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .map_err(|e| EmailError::ConfigurationError(e.to_string()))?
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            };
            Some(
                builder
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ))
                    .build(),
            )
        };

        Ok(Self {
            config,
            transport,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env(frontend_url: &str) -> Result<Self, EmailError> {
        Self::new(EmailConfig::from_env()?, frontend_url)
    }

    pub fn is_development_mode(&self) -> bool {
        self.config.development_mode
    }

    /// メールを送信
    pub async fn send_email(&self, message: EmailMessage) -> AppResult<()> {
        if !is_valid_email(&message.to_email) {
            return Err(EmailError::InvalidAddress(message.to_email).into());
        }

        let Some(transport) = &self.transport else {
            self.log_email(&message);
            return Ok(());
        };

        let email = self.build_message(&message)?;
        transport.send(email).await.map_err(|e| {
            error!(
                to_email = %mask_email(&message.to_email),
                error = %e,
                "Failed to send email"
            );
            EmailError::SendError(e.to_string())
        })?;

        info!(
            to_email = %mask_email(&message.to_email),
            subject = %message.subject,
            "Email sent successfully"
        );
        Ok(())
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        let from = Mailbox::new(
            Some(self.config.from_name.clone()),
            self.config
                .from_email
                .parse()
                .map_err(|_| EmailError::InvalidAddress(self.config.from_email.clone()))?,
        );
        let to = Mailbox::new(
            message.to_name.clone(),
            message
                .to_email
                .parse()
                .map_err(|_| EmailError::InvalidAddress(message.to_email.clone()))?,
        );

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| EmailError::SendError(e.to_string()))
    }

    /// 開発モードでのメールログ出力
    fn log_email(&self, message: &EmailMessage) {
        info!(
            to_email = %message.to_email,
            to_name = %message.to_name.as_deref().unwrap_or(""),
            subject = %message.subject,
            "Email (development mode)"
        );
        tracing::debug!(body = %message.text_body, "Email text body");
    }

    // --- 送信メソッド ---

    pub async fn send_assessment_confirmation(
        &self,
        to_email: &str,
        contact_name: &str,
        institution_name: &str,
        tier_name: &str,
        assessment_id: &str,
    ) -> AppResult<()> {
        let template = self.assessment_confirmation_template(
            contact_name,
            institution_name,
            tier_name,
            assessment_id,
        );
        self.send_email(EmailMessage::from_template(
            to_email,
            Some(contact_name),
            template,
        ))
        .await
    }

    pub async fn send_admin_submission_notice(
        &self,
        admin_email: &str,
        summary: &SubmissionSummary<'_>,
    ) -> AppResult<()> {
        let template = self.admin_submission_template(summary);
        self.send_email(EmailMessage::from_template(admin_email, None, template))
            .await
    }

    pub async fn send_team_invitation(
        &self,
        to_email: &str,
        team_name: &str,
        inviter_name: &str,
        role: &str,
        token: &str,
    ) -> AppResult<()> {
        let template = self.team_invitation_template(team_name, inviter_name, role, token);
        self.send_email(EmailMessage::from_template(to_email, None, template))
            .await
    }

    pub async fn send_collaborator_invitation(
        &self,
        to_email: &str,
        inviter_name: &str,
        role: &str,
        assessment_id: &str,
    ) -> AppResult<()> {
        let template = self.collaborator_invitation_template(inviter_name, role, assessment_id);
        self.send_email(EmailMessage::from_template(to_email, None, template))
            .await
    }

    pub async fn send_payment_failed(
        &self,
        to_email: &str,
        amount_due: &str,
        invoice_id: &str,
    ) -> AppResult<()> {
        let template = self.payment_failed_template(amount_due, invoice_id);
        self.send_email(EmailMessage::from_template(to_email, None, template))
            .await
    }

    // --- テンプレートメソッド ---

    fn wrap_html(title: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #1f2937;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    {body}
    <hr style="margin: 30px 0; border: none; border-top: 1px solid #e5e7eb;">
    <p style="font-size: 12px; color: #6b7280;">NorthPath Strategies - Organizational Realignment &amp; AI Readiness</p>
  </div>
</body>
</html>"#,
            title = title,
            body = body
        )
    }

    fn assessment_confirmation_template(
        &self,
        contact_name: &str,
        institution_name: &str,
        tier_name: &str,
        assessment_id: &str,
    ) -> EmailTemplate {
        let subject = "Thank You! Your Organizational Assessment Has Been Received".to_string();
        let results_url = format!("{}/assessment/results?id={}", self.frontend_url, assessment_id);

        let html_body = Self::wrap_html(
            &subject,
            &format!(
                r#"<h1 style="color: #1e3a8a;">Assessment Received</h1>
    <p>Hello {name},</p>
    <p>Thank you for completing the {tier} assessment for <strong>{institution}</strong>.</p>
    <p>Our analysis engine is processing your responses. You can follow progress here:</p>
    <p><a href="{url}">{url}</a></p>
    <p>Reference ID: {id}</p>"#,
                name = escape_html(contact_name),
                tier = escape_html(tier_name),
                institution = escape_html(institution_name),
                url = results_url,
                id = assessment_id,
            ),
        );

        let text_body = format!(
            "Hello {name},\n\nThank you for completing the {tier} assessment for {institution}.\n\
             Our analysis engine is processing your responses. Follow progress at:\n{url}\n\n\
             Reference ID: {id}\n\n---\nNorthPath Strategies",
            name = contact_name,
            tier = tier_name,
            institution = institution_name,
            url = results_url,
            id = assessment_id,
        );

        EmailTemplate {
            name: "assessment_confirmation",
            subject,
            html_body,
            text_body,
        }
    }

    fn admin_submission_template(&self, summary: &SubmissionSummary<'_>) -> EmailTemplate {
        let subject = format!(
            "New Assessment Submission: {} ({})",
            summary.institution_name, summary.tier_name
        );
        let admin_url = format!(
            "{}/admin/assessment/{}",
            self.frontend_url, summary.assessment_id
        );

        let html_body = Self::wrap_html(
            &subject,
            &format!(
                r#"<h1 style="color: #1e3a8a;">New Assessment Submission</h1>
    <table style="border-collapse: collapse;">
      <tr><td><strong>Institution</strong></td><td>{institution}</td></tr>
      <tr><td><strong>Organization type</strong></td><td>{org_type}</td></tr>
      <tr><td><strong>Tier</strong></td><td>{tier_name} ({tier})</td></tr>
      <tr><td><strong>Contact</strong></td><td>{contact} &lt;{email}&gt;</td></tr>
      <tr><td><strong>Responses</strong></td><td>{responses}</td></tr>
    </table>
    <p><a href="{url}">Open in admin dashboard</a></p>"#,
                institution = escape_html(summary.institution_name),
                org_type = escape_html(summary.organization_type),
                tier_name = escape_html(summary.tier_name),
                tier = summary.tier,
                contact = escape_html(summary.contact_name),
                email = escape_html(summary.contact_email),
                responses = summary.response_count,
                url = admin_url,
            ),
        );

        let text_body = format!(
            "New Assessment Submission\n\nInstitution: {}\nOrganization type: {}\nTier: {} ({})\n\
             Contact: {} <{}>\nResponses: {}\n\nAdmin dashboard: {}",
            summary.institution_name,
            summary.organization_type,
            summary.tier_name,
            summary.tier,
            summary.contact_name,
            summary.contact_email,
            summary.response_count,
            admin_url,
        );

        EmailTemplate {
            name: "admin_submission_notice",
            subject,
            html_body,
            text_body,
        }
    }

    fn team_invitation_template(
        &self,
        team_name: &str,
        inviter_name: &str,
        role: &str,
        token: &str,
    ) -> EmailTemplate {
        let subject = format!(
            "{} has invited you to join the {} team",
            inviter_name, team_name
        );
        let accept_url = format!("{}/teams/invitations/accept?token={}", self.frontend_url, token);

        let html_body = Self::wrap_html(
            &subject,
            &format!(
                r#"<h1 style="color: #1e3a8a;">Team Invitation</h1>
    <p><strong>{inviter}</strong> has invited you to join <strong>{team}</strong> as a {role}.</p>
    <p><a href="{url}">Accept invitation</a></p>
    <p>This invitation expires in 7 days.</p>"#,
                inviter = escape_html(inviter_name),
                team = escape_html(team_name),
                role = escape_html(role),
                url = accept_url,
            ),
        );

        let text_body = format!(
            "{} has invited you to join {} as a {}.\n\nAccept the invitation:\n{}\n\n\
             This invitation expires in 7 days.",
            inviter_name, team_name, role, accept_url
        );

        EmailTemplate {
            name: "team_invitation",
            subject,
            html_body,
            text_body,
        }
    }

    fn collaborator_invitation_template(
        &self,
        inviter_name: &str,
        role: &str,
        assessment_id: &str,
    ) -> EmailTemplate {
        let subject = format!(
            "{} has invited you to collaborate on an Organizational Assessment",
            inviter_name
        );
        let assessment_url = format!(
            "{}/assessment/collaborate/{}",
            self.frontend_url, assessment_id
        );

        let html_body = Self::wrap_html(
            &subject,
            &format!(
                r#"<h1 style="color: #1e3a8a;">Collaboration Invitation</h1>
    <p><strong>{inviter}</strong> added you to an assessment with the role <strong>{role}</strong>.</p>
    <p><a href="{url}">Open the assessment</a></p>"#,
                inviter = escape_html(inviter_name),
                role = escape_html(role),
                url = assessment_url,
            ),
        );

        let text_body = format!(
            "{} added you to an assessment with the role {}.\n\nOpen the assessment:\n{}",
            inviter_name, role, assessment_url
        );

        EmailTemplate {
            name: "collaborator_invitation",
            subject,
            html_body,
            text_body,
        }
    }

    fn payment_failed_template(&self, amount_due: &str, invoice_id: &str) -> EmailTemplate {
        let subject = "Action required: your NorthPath payment failed".to_string();
        let billing_url = format!("{}/account/billing", self.frontend_url);

        let html_body = Self::wrap_html(
            &subject,
            &format!(
                r#"<h1 style="color: #b91c1c;">Payment Failed</h1>
    <p>We could not process the payment of <strong>{amount}</strong> for invoice {invoice}.</p>
    <p>Please update your payment method to keep your subscription active.</p>
    <p><a href="{url}">Update billing details</a></p>"#,
                amount = escape_html(amount_due),
                invoice = escape_html(invoice_id),
                url = billing_url,
            ),
        );

        let text_body = format!(
            "We could not process the payment of {} for invoice {}.\n\
             Please update your payment method to keep your subscription active:\n{}",
            amount_due, invoice_id, billing_url
        );

        EmailTemplate {
            name: "payment_failed",
            subject,
            html_body,
            text_body,
        }
    }
}
