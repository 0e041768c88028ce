//! HTML email bodies.

use chrono::{DateTime, Utc};

/// Values shown in the password reset confirmation email.
#[derive(Debug, Clone)]
pub struct ResetPasswordParams {
    pub username: String,
    pub email: String,
    pub ipaddress: String,
    pub date: DateTime<Utc>,
}

/// Render the password reset confirmation email.
pub fn password_reset_confirmation(params: &ResetPasswordParams) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>Password Reset Confirmation</title>
  </head>
  <body style="font-family: Arial, sans-serif; color: #333333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <h2>Password Reset Confirmation</h2>
      <p>Hello {username},</p>
      <p>The password for the account <b>{email}</b> was changed.</p>
      <p>IP address: <b>{ipaddress}</b></p>
      <p>Date: <b>{date}</b></p>
      <p>If you did not make this change, please contact support immediately.</p>
      <p>Chatty App</p>
    </div>
  </body>
</html>
"#,
        username = escape(&params.username),
        email = escape(&params.email),
        ipaddress = escape(&params.ipaddress),
        date = params.date.format("%d/%m/%Y %H:%M"),
    )
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
