use crate::error::AppError;
use log::{debug, warn};
use regex::{Captures, Regex};
use std::io::ErrorKind;
use std::path::Path;

pub const CONFIRM_TEMPLATE: &str = "confirm";
pub const SPONSOR_TEMPLATE: &str = "sponsor";

pub const DEFAULT_CONFIRM_TEMPLATE: &str = r#"
      <p>Hello {{name}},</p>
      <p>Please confirm your Memory M8 subscription:</p>
      <p><a href="{{confirmUrl}}">Confirm subscription</a></p>
      <p>Thank you.</p>
      <img src="cid:mm8logo" alt="Memory M8" />
"#;

pub const DEFAULT_SPONSOR_TEMPLATE: &str = r#"<!doctype html><meta charset="utf-8"><div style="font-family:system-ui,Segoe UI,Arial">
         <h2>Thank you for your sponsorship pledge</h2>
         <p>Your pledge of <strong>£{{amount}}</strong> helps us deliver calm, dignified reassurance.</p>
         <p>That’s around <strong>{{days}}</strong> days of access for someone who needs it most.</p>
       </div>"#;

/// Loads `{templates_dir}/{name}.html`, falling back to `default` when the
/// file does not exist or cannot be read.
pub async fn load_template(templates_dir: &str, name: &str, default: &str) -> String {
    let path = Path::new(templates_dir).join(format!("{}.html", name));

    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => {
            debug!("Loaded email template {}", path.display());
            contents
        }
        Err(e) if e.kind() == ErrorKind::NotFound => default.to_string(),
        Err(e) => {
            warn!("Failed to read email template {}: {}; using built-in default", path.display(), e);
            default.to_string()
        }
    }
}

/// Replaces every `{{ key }}` placeholder with the HTML-escaped value in a
/// single pass, so placeholders inside substituted values stay literal.
/// Placeholders without a value are left untouched.
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String, AppError> {
    let pattern = Regex::new(r"\{\{\s*(\w+)\s*\}\}")
        .map_err(|e| AppError::Internal(format!("Invalid template placeholder pattern: {}", e)))?;

    let rendered = pattern.replace_all(template, |caps: &Captures| {
        let key = &caps[1];
        values
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| html_escape(value))
            .unwrap_or_else(|| caps[0].to_string())
    });

    Ok(rendered.into_owned())
}

/// Escapes HTML special characters so user input cannot inject markup.
pub fn html_escape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(c),
        }
    }
    output
}
