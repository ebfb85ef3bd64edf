//! # Daily Summary Mailer
//!
//! Renders the end-of-day summary and sends it through Resend.
//!
//! ```text
//! POST {base_url}/emails
//! Authorization: Bearer <api key>
//! { "from": ..., "to": [...], "subject": ..., "html": ... }
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;
use tracing::{debug, info};

use super::{ServiceError, ServiceResult};
use crate::config::ResendSettings;
use kiosk_core::reports::DailySummary;
use kiosk_core::Money;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const WEEKDAYS: [&str; 7] = ["domingo", "lunes", "martes", "miércoles", "jueves", "viernes", "sábado"];

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Resend client for one sender and a fixed recipient list.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    from: String,
    recipients: Vec<String>,
}

impl ResendMailer {
    /// `None` when no API key is configured.
    pub fn from_settings(settings: &ResendSettings) -> Option<Self> {
        let api_key = settings.api_key.clone().filter(|k| !k.trim().is_empty())?;
        Some(ResendMailer {
            client: reqwest::Client::new(),
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            from: settings.from.clone(),
            recipients: settings.recipients.clone(),
        })
    }

    /// Sends one HTML email to every configured recipient.
    ///
    /// Returns the provider's message id when it reports one.
    pub async fn send(&self, subject: &str, html: &str) -> ServiceResult<Option<String>> {
        if self.recipients.is_empty() {
            return Err(ServiceError::NotConfigured("Summary recipients"));
        }

        let url = format!("{}/emails", self.base_url);
        debug!(url = %url, recipients = self.recipients.len(), "Sending email");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&SendEmailRequest {
                from: &self.from,
                to: &self.recipients,
                subject,
                html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream {
                provider: "Resend",
                status: status.as_u16(),
                detail,
            });
        }

        let body: SendEmailResponse = response.json().await?;
        info!(id = ?body.id, "Email accepted by Resend");
        Ok(body.id)
    }

    /// Renders and sends the daily summary.
    pub async fn send_daily_summary(&self, summary: &DailySummary, currency_symbol: &str) -> ServiceResult<Option<String>> {
        let subject = summary_subject(summary, currency_symbol);
        let html = render_summary_html(summary, currency_symbol);
        self.send(&subject, &html).await
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// "jueves, 16 de octubre de 2026"
pub fn spanish_long_date(date: NaiveDate) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_sunday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{}, {} de {} de {}", weekday, date.day(), month, date.year())
}

fn format_amount(symbol: &str, cents: i64) -> String {
    format!("{}{}", symbol, Money::from_cents(cents).to_decimal_string())
}

pub fn summary_subject(summary: &DailySummary, currency_symbol: &str) -> String {
    format!(
        "☕ Resumen del día - {} · {} · {} pedidos",
        spanish_long_date(summary.date),
        format_amount(currency_symbol, summary.total_revenue_cents),
        summary.total_orders
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Inline-styled HTML body in the café's green and lime palette.
pub fn render_summary_html(summary: &DailySummary, currency_symbol: &str) -> String {
    let mut html = String::new();

    html.push_str(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; background: #F8F9F5; padding: 20px;">"#,
    );
    html.push_str(
        r#"<div style="background: #155020; padding: 30px; border-radius: 12px; text-align: center; margin-bottom: 20px;">
<h1 style="color: #C8D96F; margin: 0; font-size: 28px;">MATCHA CHÁ</h1>
<p style="color: #ffffff; margin: 8px 0 0 0;">Resumen del Día</p>
</div>"#,
    );

    // write! into a String cannot fail
    let _ = write!(
        html,
        r#"<p style="color: #155020; font-size: 14px; text-align: center; text-transform: capitalize;">{}</p>"#,
        spanish_long_date(summary.date)
    );

    let _ = write!(
        html,
        r#"<div style="display: flex; gap: 16px; margin: 20px 0;">
<div style="flex: 1; background: #ffffff; border-radius: 12px; padding: 20px; text-align: center; border-left: 4px solid #155020;">
<p style="margin: 0; color: #666; font-size: 13px;">Total Pedidos</p>
<p style="margin: 8px 0 0 0; color: #155020; font-size: 32px; font-weight: bold;">{}</p>
</div>
<div style="flex: 1; background: #ffffff; border-radius: 12px; padding: 20px; text-align: center; border-left: 4px solid #C8D96F;">
<p style="margin: 0; color: #666; font-size: 13px;">Ingresos del Día</p>
<p style="margin: 8px 0 0 0; color: #155020; font-size: 32px; font-weight: bold;">{}</p>
</div>
</div>"#,
        summary.total_orders,
        escape_html(&format_amount(currency_symbol, summary.total_revenue_cents))
    );

    if !summary.top_products.is_empty() {
        html.push_str(
            r#"<div style="background: #ffffff; border-radius: 12px; padding: 20px; margin-bottom: 16px;">
<h3 style="color: #155020; margin: 0 0 16px 0;">🏆 Productos Más Vendidos</h3>"#,
        );
        for (i, product) in summary.top_products.iter().enumerate() {
            let _ = write!(
                html,
                r#"<div style="display: flex; justify-content: space-between; padding: 10px 0; border-bottom: 1px solid #f0f0f0;">
<span style="color: #333;">{}. {}</span>
<span style="color: #155020; font-weight: bold;">{} unidades</span>
</div>"#,
                i + 1,
                escape_html(&product.name),
                product.quantity
            );
        }
        html.push_str("</div>");
    }

    if summary.total_orders == 0 {
        html.push_str(
            r#"<div style="background: #fff3cd; border-radius: 12px; padding: 20px; text-align: center;">
<p style="color: #856404; margin: 0;">No hubo pedidos hoy.</p>
</div>"#,
        );
    }

    html.push_str(
        r#"<div style="text-align: center; margin-top: 30px; padding-top: 20px; border-top: 1px solid #ddd;">
<p style="color: #999; font-size: 12px;">Matcha Chá · Sistema de Gestión de Pedidos</p>
</div>
</div>"#,
    );

    html
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use kiosk_core::reports::TopProduct;
    use std::sync::{Arc, Mutex};

    fn summary(total_orders: usize, revenue: i64, top: &[(&str, i64)]) -> DailySummary {
        DailySummary {
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            total_orders,
            total_revenue_cents: revenue,
            top_products: top
                .iter()
                .map(|(name, quantity)| TopProduct {
                    name: name.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_spanish_long_date() {
        assert_eq!(
            spanish_long_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
            "viernes, 16 de octubre de 2026"
        );
        assert_eq!(
            spanish_long_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            "miércoles, 1 de enero de 2025"
        );
    }

    #[test]
    fn test_subject_line() {
        let s = summary(3, 2499, &[]);
        assert_eq!(
            summary_subject(&s, "$"),
            "☕ Resumen del día - viernes, 16 de octubre de 2026 · $24.99 · 3 pedidos"
        );
    }

    #[test]
    fn test_html_lists_top_products() {
        let s = summary(4, 4150, &[("matchaLatte", 5), ("espresso", 2)]);
        let html = render_summary_html(&s, "$");

        assert!(html.contains("MATCHA CHÁ"));
        assert!(html.contains("Resumen del Día"));
        assert!(html.contains("$41.50"));
        assert!(html.contains("1. matchaLatte"));
        assert!(html.contains("5 unidades"));
        assert!(html.contains("2. espresso"));
        assert!(!html.contains("No hubo pedidos hoy."));
        assert!(html.contains("Matcha Chá · Sistema de Gestión de Pedidos"));
    }

    #[test]
    fn test_html_for_empty_day() {
        let html = render_summary_html(&summary(0, 0, &[]), "$");
        assert!(html.contains("No hubo pedidos hoy."));
        assert!(!html.contains("Productos Más Vendidos"));
        assert!(html.contains("$0.00"));
    }

    #[test]
    fn test_html_escapes_names() {
        let html = render_summary_html(&summary(1, 100, &[("<b>cookie</b>", 1)]), "$");
        assert!(html.contains("&lt;b&gt;cookie&lt;/b&gt;"));
    }

    #[test]
    fn test_missing_key_disables_mailer() {
        let settings = ResendSettings::default();
        assert!(ResendMailer::from_settings(&settings).is_none());

        let settings = ResendSettings {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(ResendMailer::from_settings(&settings).is_none());
    }

    type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn fake_resend(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));

        async fn handler(
            State((captured, status)): State<(Captured, StatusCode)>,
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            captured.lock().unwrap().push((auth, body));
            if status.is_success() {
                (status, Json(serde_json::json!({ "id": "email_123" })))
            } else {
                (status, Json(serde_json::json!({ "message": "domain not verified" })))
            }
        }

        let app = Router::new()
            .route("/emails", post(handler))
            .with_state((captured.clone(), status));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), captured)
    }

    fn mailer(base_url: String, recipients: Vec<String>) -> ResendMailer {
        ResendMailer::from_settings(&ResendSettings {
            api_key: Some("re_test".to_string()),
            base_url,
            recipients,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_to_resend() {
        let (base_url, captured) = fake_resend(StatusCode::OK).await;
        let mailer = mailer(base_url, vec!["owner@matcha.cafe".to_string()]);

        let id = mailer
            .send_daily_summary(&summary(2, 1100, &[("espresso", 2)]), "$")
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("email_123"));

        let calls = captured.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (auth, body) = &calls[0];
        assert_eq!(auth.as_deref(), Some("Bearer re_test"));
        assert_eq!(body["from"], "Matcha Chá <onboarding@resend.dev>");
        assert_eq!(body["to"][0], "owner@matcha.cafe");
        assert!(body["subject"].as_str().unwrap().contains("$11.00 · 2 pedidos"));
        assert!(body["html"].as_str().unwrap().contains("1. espresso"));
    }

    #[tokio::test]
    async fn test_provider_error_carries_detail() {
        let (base_url, _) = fake_resend(StatusCode::FORBIDDEN).await;
        let mailer = mailer(base_url, vec!["owner@matcha.cafe".to_string()]);

        let err = mailer.send("subject", "<p>hi</p>").await.unwrap_err();
        match err {
            ServiceError::Upstream { provider, status, detail } => {
                assert_eq!(provider, "Resend");
                assert_eq!(status, 403);
                assert!(detail.contains("domain not verified"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_recipients_is_configuration_error() {
        let mailer = mailer("http://127.0.0.1:9".to_string(), Vec::new());
        let err = mailer.send("subject", "<p>hi</p>").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotConfigured(_)));
    }
}
