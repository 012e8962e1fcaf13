//! Email templates with `{{variable}}` placeholders.
//!
//! Values substituted into the HTML bodies are escaped; the text bodies take
//! them verbatim.

use super::{EmailContent, EmailKind};

/// Subject used when neither the request nor the session has one
pub const FALLBACK_SUBJECT: &str = "Support Ticket";

const GREETING_FALLBACK: &str = "there";

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 0; background-color: #f5f5f5;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">"#;

const HTML_TAIL: &str = r#"
  </div>
</body>
</html>"#;

const SIGN_OFF: &str = r#"
      <p style="color: #666; font-size: 14px; line-height: 1.6; margin-top: 30px;">
        {{closing}}<br>
        The Waylo Support Team
      </p>"#;

const SUPPORT_REPLY_HTML: &str = r#"
    <div style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 30px; border-radius: 16px 16px 0 0; text-align: center;">
      <h1 style="color: white; margin: 0; font-size: 24px;">New Support Reply</h1>
    </div>
    <div style="background-color: white; padding: 30px; border-radius: 0 0 16px 16px;">
      <p style="color: #333; font-size: 16px; line-height: 1.6;">Hi {{user_name}},</p>
      <p style="color: #333; font-size: 16px; line-height: 1.6;">We've replied to your support ticket:</p>
      <div style="background-color: #f8f9fa; border-left: 4px solid #667eea; padding: 15px; margin: 20px 0; border-radius: 4px;">
        <strong style="color: #667eea;">{{subject}}</strong>
      </div>{{message_block}}
      <div style="text-align: center; margin-top: 30px;">
        <a href="https://waylo.app/support" style="display: inline-block; background: #667eea; color: white; text-decoration: none; padding: 14px 30px; border-radius: 8px; font-weight: 600;">View Full Conversation</a>
      </div>{{sign_off}}
    </div>
    <div style="text-align: center; padding: 20px; color: #999; font-size: 12px;">
      <p>You're receiving this because you have email notifications enabled for support updates.</p>
      <p>Manage your notification preferences in the Waylo app settings.</p>
    </div>"#;

const MESSAGE_BLOCK_HTML: &str = r#"
      <div style="background-color: #f0f4ff; padding: 20px; border-radius: 8px; margin: 20px 0;">
        <p style="color: #333; font-size: 14px; line-height: 1.6; margin: 0;">{{message}}</p>
      </div>"#;

const SUPPORT_REPLY_TEXT: &str = "Hi {{user_name}},

We've replied to your support ticket: \"{{subject}}\"

{{message_line}}

View the full conversation in the Waylo app.

Thank you for using Waylo!
The Waylo Support Team";

const TICKET_CREATED_HTML: &str = r#"
    <div style="background: linear-gradient(135deg, #10b981 0%, #059669 100%); padding: 30px; border-radius: 16px 16px 0 0; text-align: center;">
      <h1 style="color: white; margin: 0; font-size: 24px;">Ticket Received</h1>
    </div>
    <div style="background-color: white; padding: 30px; border-radius: 0 0 16px 16px;">
      <p style="color: #333; font-size: 16px; line-height: 1.6;">Hi {{user_name}},</p>
      <p style="color: #333; font-size: 16px; line-height: 1.6;">We've received your support request and our team is on it!</p>
      <div style="background-color: #f8f9fa; border-left: 4px solid #10b981; padding: 15px; margin: 20px 0; border-radius: 4px;">
        <strong style="color: #10b981;">{{subject}}</strong>
      </div>
      <p style="color: #666; font-size: 14px; line-height: 1.6;">We typically respond within 24 hours. You'll receive a notification when we reply.</p>
      <div style="text-align: center; margin-top: 30px;">
        <a href="https://waylo.app/support" style="display: inline-block; background: #10b981; color: white; text-decoration: none; padding: 14px 30px; border-radius: 8px; font-weight: 600;">View Ticket</a>
      </div>{{sign_off}}
    </div>"#;

const TICKET_CREATED_TEXT: &str = "Hi {{user_name}},

We've received your support request and our team is on it!

Subject: {{subject}}

We typically respond within 24 hours. You'll receive a notification when we reply.

Thank you for reaching out!
The Waylo Support Team";

const STATUS_CHANGED_HTML: &str = r#"
    <div style="background: linear-gradient(135deg, #f59e0b 0%, #d97706 100%); padding: 30px; border-radius: 16px 16px 0 0; text-align: center;">
      <h1 style="color: white; margin: 0; font-size: 24px;">{{status_emoji}} Ticket Status Updated</h1>
    </div>
    <div style="background-color: white; padding: 30px; border-radius: 0 0 16px 16px;">
      <p style="color: #333; font-size: 16px; line-height: 1.6;">Hi {{user_name}},</p>
      <p style="color: #333; font-size: 16px; line-height: 1.6;">Your support ticket status has been updated:</p>
      <div style="background-color: #f8f9fa; border-left: 4px solid #f59e0b; padding: 15px; margin: 20px 0; border-radius: 4px;">
        <strong style="color: #f59e0b;">{{subject}}</strong>
        <p style="margin: 10px 0 0 0; color: #666;">New Status: <strong>{{status}}</strong></p>
      </div>
      <div style="text-align: center; margin-top: 30px;">
        <a href="https://waylo.app/support" style="display: inline-block; background: #f59e0b; color: white; text-decoration: none; padding: 14px 30px; border-radius: 8px; font-weight: 600;">View Ticket</a>
      </div>
    </div>"#;

const STATUS_CHANGED_TEXT: &str = "Hi {{user_name}},

Your support ticket \"{{subject}}\" status has been updated to: {{status}}

View the ticket in the Waylo app for more details.

The Waylo Support Team";

const RESOLVED_HTML: &str = r#"
    <div style="background: linear-gradient(135deg, #10b981 0%, #059669 100%); padding: 30px; border-radius: 16px 16px 0 0; text-align: center;">
      <h1 style="color: white; margin: 0; font-size: 24px;">Ticket Resolved</h1>
    </div>
    <div style="background-color: white; padding: 30px; border-radius: 0 0 16px 16px;">
      <p style="color: #333; font-size: 16px; line-height: 1.6;">Hi {{user_name}},</p>
      <p style="color: #333; font-size: 16px; line-height: 1.6;">Great news! Your support ticket has been resolved:</p>
      <div style="background-color: #f0fdf4; border-left: 4px solid #10b981; padding: 15px; margin: 20px 0; border-radius: 4px;">
        <strong style="color: #10b981;">{{subject}}</strong>
      </div>
      <p style="color: #666; font-size: 14px; line-height: 1.6;">If you have any more questions or if the issue persists, feel free to reopen the ticket or create a new one.</p>
      <div style="text-align: center; margin-top: 30px;">
        <a href="https://waylo.app/support" style="display: inline-block; background: #10b981; color: white; text-decoration: none; padding: 14px 30px; border-radius: 8px; font-weight: 600;">View Ticket</a>
      </div>{{sign_off}}
    </div>"#;

const RESOLVED_TEXT: &str = "Hi {{user_name}},

Great news! Your support ticket has been resolved:

Subject: {{subject}}

If you have any more questions or if the issue persists, feel free to reopen the ticket or create a new one.

Thank you for using Waylo!
The Waylo Support Team";

/// Replace every `{{key}}` in `template` with its value.
pub fn substitute(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in variables {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, value);
    }
    result
}

/// Display label and emoji for a ticket status
pub fn status_label(status: Option<&str>) -> (String, &'static str) {
    match status {
        Some("in_progress") => ("In Progress".to_string(), "\u{1f504}"),
        Some("closed") => ("Closed".to_string(), "\u{1f4cb}"),
        Some(other) if !other.trim().is_empty() => (other.to_string(), "\u{1f4cc}"),
        _ => ("Updated".to_string(), "\u{1f4cc}"),
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(body: &str) -> String {
    format!("{}{}{}", HTML_HEAD, body, HTML_TAIL)
}

/// Render the email for `kind`.
///
/// `user_name` falls back to "there"; `subject` is expected to be resolved
/// already (see [`FALLBACK_SUBJECT`]).
pub fn render(
    kind: EmailKind,
    user_name: Option<&str>,
    subject: &str,
    message: Option<&str>,
    new_status: Option<&str>,
) -> EmailContent {
    let user_name = user_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(GREETING_FALLBACK);
    let message = message.filter(|m| !m.trim().is_empty());

    let html_name = escape_html(user_name);
    let html_subject = escape_html(subject);

    match kind {
        EmailKind::SupportReply => {
            let message_block = message
                .map(|m| substitute(MESSAGE_BLOCK_HTML, &[("message", escape_html(m).as_str())]))
                .unwrap_or_default();
            let message_line = message.map(|m| format!("Reply: {}", m)).unwrap_or_default();
            let sign_off = substitute(SIGN_OFF, &[("closing", "Thank you for using Waylo!")]);

            EmailContent {
                subject: format!("Re: {} - New Reply from Waylo Support", subject),
                html: page(&substitute(
                    SUPPORT_REPLY_HTML,
                    &[
                        ("message_block", message_block.as_str()),
                        ("sign_off", sign_off.as_str()),
                        ("user_name", html_name.as_str()),
                        ("subject", html_subject.as_str()),
                    ],
                )),
                text: substitute(
                    SUPPORT_REPLY_TEXT,
                    &[
                        ("user_name", user_name),
                        ("subject", subject),
                        ("message_line", message_line.as_str()),
                    ],
                ),
            }
        }
        EmailKind::TicketCreated => {
            let sign_off = substitute(SIGN_OFF, &[("closing", "Thank you for reaching out!")]);
            EmailContent {
                subject: format!("Support Ticket Created: {}", subject),
                html: page(&substitute(
                    TICKET_CREATED_HTML,
                    &[
                        ("sign_off", sign_off.as_str()),
                        ("user_name", html_name.as_str()),
                        ("subject", html_subject.as_str()),
                    ],
                )),
                text: substitute(
                    TICKET_CREATED_TEXT,
                    &[("user_name", user_name), ("subject", subject)],
                ),
            }
        }
        EmailKind::TicketStatusChanged => {
            let (status, emoji) = status_label(new_status);
            EmailContent {
                subject: format!("Ticket Update: {} - {}", subject, status),
                html: page(&substitute(
                    STATUS_CHANGED_HTML,
                    &[
                        ("status_emoji", emoji),
                        ("status", escape_html(&status).as_str()),
                        ("user_name", html_name.as_str()),
                        ("subject", html_subject.as_str()),
                    ],
                )),
                text: substitute(
                    STATUS_CHANGED_TEXT,
                    &[("user_name", user_name), ("subject", subject), ("status", status.as_str())],
                ),
            }
        }
        EmailKind::TicketResolved => {
            let sign_off = substitute(SIGN_OFF, &[("closing", "Thank you for using Waylo!")]);
            EmailContent {
                subject: format!("Ticket Resolved: {}", subject),
                html: page(&substitute(
                    RESOLVED_HTML,
                    &[
                        ("sign_off", sign_off.as_str()),
                        ("user_name", html_name.as_str()),
                        ("subject", html_subject.as_str()),
                    ],
                )),
                text: substitute(RESOLVED_TEXT, &[("user_name", user_name), ("subject", subject)]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute() {
        assert_eq!(
            substitute("Hi {{name}}, re {{subject}}", &[("name", "Ana"), ("subject", "Refund")]),
            "Hi Ana, re Refund"
        );
        assert_eq!(substitute("{{missing}}", &[]), "{{missing}}");
    }

    #[test]
    fn test_support_reply() {
        let email = render(
            EmailKind::SupportReply,
            Some("Ana"),
            "Refund",
            Some("We issued it <today>"),
            None,
        );

        assert_eq!(email.subject, "Re: Refund - New Reply from Waylo Support");
        assert!(email.html.contains("Hi Ana,"));
        assert!(email.html.contains("We issued it &lt;today&gt;"));
        assert!(email.text.contains("Reply: We issued it <today>"));
        assert!(!email.html.contains("{{"));
    }

    #[test]
    fn test_support_reply_without_message() {
        let email = render(EmailKind::SupportReply, None, "Refund", None, None);
        assert!(email.text.starts_with("Hi there,"));
        assert!(!email.html.contains("#f0f4ff"));
    }

    #[test]
    fn test_ticket_created() {
        let email = render(EmailKind::TicketCreated, Some("Bo"), "Login issue", None, None);
        assert_eq!(email.subject, "Support Ticket Created: Login issue");
        assert!(email.text.contains("Subject: Login issue"));
        assert!(email.html.contains("Thank you for reaching out!"));
    }

    #[test]
    fn test_status_changed() {
        let email = render(
            EmailKind::TicketStatusChanged,
            Some("Bo"),
            "Login issue",
            None,
            Some("in_progress"),
        );
        assert_eq!(email.subject, "Ticket Update: Login issue - In Progress");
        assert!(email.text.contains("updated to: In Progress"));

        let email = render(
            EmailKind::TicketStatusChanged,
            Some("Bo"),
            "Login issue",
            None,
            Some("waiting_on_user"),
        );
        assert_eq!(email.subject, "Ticket Update: Login issue - waiting_on_user");
    }

    #[test]
    fn test_resolved() {
        let email = render(EmailKind::TicketResolved, Some("Bo"), "Login issue", None, None);
        assert_eq!(email.subject, "Ticket Resolved: Login issue");
        assert!(email.html.contains("Great news!"));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(Some("closed")).0, "Closed");
        assert_eq!(status_label(None).0, "Updated");
        assert_eq!(status_label(Some("  ")).0, "Updated");
    }
}
