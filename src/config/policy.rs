use std::fs;

use log::info;
use thiserror::Error;

/// Built-in operating policy. Sent ahead of every conversation replay and
/// never shown to the widget user.
pub const DEFAULT_POLICY: &str = r#"You are a friendly restaurant assistant for Oceanview Bistro.
Your job is to answer questions about our menu, hours, and make reservation bookings for users.
For bookings, ask for the date, time, number of guests, and name. Confirm the reservation and provide a summary. If you need more info, ask follow-up questions. Be concise and polite.

SAFETY RULES:
- Do NOT share personal information, payment details, or request sensitive data.
- Do NOT answer medical, legal, or financial questions.
- If asked about topics unrelated to the restaurant, politely refuse and redirect to restaurant services.
- Never make promises about discounts, offers, or policies not explicitly mentioned.
- Always be respectful and professional.

ACCURACY RULES:
- Do NOT make up information, speculate, or add filler statements.
- Only answer based on explicit information provided to you about the restaurant (menu, hours, reservation policy).
- If you do not know the answer, simply say "I'm sorry, I don't have that information."
- Do NOT invent menu items, hours, or policies.
- Do NOT mention anything about the menu, hours, or policies unless you have been given that information.
- Do NOT say anything about the menu being extensive, changing seasonally, or similar unless explicitly told.
"#;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("policy file '{0}' is empty")]
    Empty(String),
}

/// Returns the policy preamble: the built-in default, or the contents of
/// `path` when one is configured. An empty override file is a
/// configuration error, not an empty policy.
pub fn load_policy(path: Option<&str>) -> Result<String, PolicyError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| PolicyError::Io {
                path: path.to_string(),
                source,
            })?;
            if text.trim().is_empty() {
                return Err(PolicyError::Empty(path.to_string()));
            }
            info!("Loaded policy preamble from: {}", path);
            Ok(text)
        }
        None => Ok(DEFAULT_POLICY.to_string()),
    }
}
