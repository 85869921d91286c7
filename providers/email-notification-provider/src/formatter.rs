use handlebars::Handlebars;
use notification_common::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::json;

const ALERT_TEMPLATE: &str = "alert_email";
const FOOTER: &str = "You are receiving this because you are listed as a supplier contact.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPayload {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text_content: String,
    pub html_content: Option<String>,
    pub reply_to: Option<String>,
}

/// Renders the plain-text alert body into the HTML email body
pub struct EmailFormatter {
    templates: Handlebars<'static>,
}

impl EmailFormatter {
    pub fn new() -> Result<Self, ProviderError> {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(false);

        templates
            .register_template_string(
                ALERT_TEMPLATE,
                include_str!("../templates/alert_email.hbs"),
            )
            .map_err(|e| {
                ProviderError::InternalError(format!("Invalid email template: {}", e))
            })?;

        Ok(Self { templates })
    }

    pub fn build_payload(
        &self,
        to: &str,
        from: &str,
        subject: &str,
        body: &str,
    ) -> EmailPayload {
        EmailPayload {
            to: to.trim().to_string(),
            from: from.to_string(),
            subject: subject.to_string(),
            text_content: body.to_string(),
            html_content: Some(self.render_html(subject, body)),
            reply_to: None,
        }
    }

    /// Handlebars escapes every interpolated value, so product names with
    /// markup characters come out as text.
    pub fn render_html(&self, subject: &str, body: &str) -> String {
        let lines: Vec<&str> = body.lines().filter(|l| !l.trim().is_empty()).collect();
        let context = json!({
            "subject": subject,
            "lines": lines,
            "footer": FOOTER,
        });

        // Try to render with template, fallback to basic HTML
        match self.templates.render(ALERT_TEMPLATE, &context) {
            Ok(html) => html,
            Err(_) => generate_basic_html(subject, &lines),
        }
    }
}

fn generate_basic_html(subject: &str, lines: &[&str]) -> String {
    let mut html = format!(
        "<html><body><h2>{}</h2>",
        handlebars::html_escape(subject)
    );
    for line in lines {
        html.push_str(&format!("<p>{}</p>", handlebars::html_escape(line)));
    }
    html.push_str("</body></html>");
    html
}
