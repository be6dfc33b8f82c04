use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use pulldown_cmark::{html, Options, Parser};
use rand::seq::SliceRandom;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::info;

static EMAIL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,63}$").expect("static regex")
});

const DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "10minutemail.com",
    "guerrillamail.com",
    "temp-mail.org",
    "yopmail.com",
    "trashmail.com",
    "sharklasers.com",
    "burnermail.io",
];

const OPENERS: &[&str] = &[
    "Thanks for taking a moment. Here is a short brief I hope is useful.",
    "I did some digging and wrapped up the key points below.",
    "Here is a clear summary so you can skim and get the picture.",
    "I gathered the highlights so they are easy to follow.",
    "Here is a quick brief without the extra noise.",
];

const SUBJECT_TOPIC_CHARS: usize = 60;

#[derive(Error, Debug, PartialEq)]
pub enum EmailError {
    #[error("Generate a brief first.")]
    EmptyBrief,

    #[error("Please enter a valid email address (e.g., name@example.com).")]
    InvalidAddress,

    #[error("Disposable email domains aren't supported. Please use a regular email.")]
    DisposableDomain,

    #[error("SMTP credentials are not configured")]
    MissingCredentials,

    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: String,
}

pub fn validate_recipient(to: &str) -> Result<Mailbox, EmailError> {
    let to = to.trim();
    if !EMAIL_ADDRESS.is_match(to) {
        return Err(EmailError::InvalidAddress);
    }
    let domain = to
        .rsplit_once('@')
        .map(|(_, d)| d.to_lowercase())
        .ok_or(EmailError::InvalidAddress)?;
    if DISPOSABLE_DOMAINS.contains(&domain.as_str()) {
        return Err(EmailError::DisposableDomain);
    }
    to.parse::<Mailbox>().map_err(|_| EmailError::InvalidAddress)
}

pub fn subject_for(topic: &str) -> String {
    let short: String = topic.trim().chars().take(SUBJECT_TOPIC_CHARS).collect();
    format!("Brief: {short}")
}

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

pub fn build_email_html(topic: &str, markdown: &str) -> String {
    let opener = OPENERS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(OPENERS[0]);
    let body = render_markdown(markdown);
    let topic = escape_html(topic);

    format!(
        r#"<html>
  <head>
    <meta charset="utf-8" />
    <style>
      body {{ font-family: -apple-system, Segoe UI, Roboto, Arial, sans-serif; line-height: 1.6; background: #f9fafb; margin: 0; }}
      .container {{ max-width: 700px; margin: 20px auto; padding: 24px; background: #fff; border-radius: 12px; }}
      .card {{ padding: 16px; border-left: 4px solid #2563eb; background: #f9f9ff; border-radius: 8px; font-size: 14px; }}
      .footer {{ margin-top: 20px; font-size: 13px; color: #444; }}
    </style>
  </head>
  <body>
    <div class="container">
      <div class="opener">Hi there,<br><br>{opener}</div>
      <div class="card">
        <p><strong>Topic:</strong> {topic}</p>
        {body}
      </div>
      <div class="footer"><em>Sent by the intelligence brief service</em></div>
    </div>
  </body>
</html>"#
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub async fn send_brief(
    smtp: &SmtpSettings,
    topic: &str,
    markdown: &str,
    to: &str,
) -> Result<(), EmailError> {
    if markdown.trim().is_empty() {
        return Err(EmailError::EmptyBrief);
    }
    let recipient = validate_recipient(to)?;
    let (Some(user), Some(pass)) = (smtp.user.clone(), smtp.pass.clone()) else {
        return Err(EmailError::MissingCredentials);
    };

    let from = format!("Intelligence Brief <{}>", smtp.from)
        .parse::<Mailbox>()
        .map_err(|e| EmailError::Delivery(e.to_string()))?;
    let email = Message::builder()
        .from(from)
        .to(recipient)
        .subject(subject_for(topic))
        .header(ContentType::TEXT_HTML)
        .body(build_email_html(topic, markdown))
        .map_err(|e| EmailError::Delivery(e.to_string()))?;

    let mailer: AsyncSmtpTransport<Tokio1Executor> =
        AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
            .map_err(|e| EmailError::Delivery(e.to_string()))?
            .credentials(Credentials::new(user, pass))
            .build();
    mailer
        .send(email)
        .await
        .map_err(|e| EmailError::Delivery(e.to_string()))?;

    info!("Brief emailed");
    Ok(())
}
