use serde::{ Serialize, Deserialize };

use crate::models::chat::{ Message, Role };

/// One text block inside a payload element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadPart {
    pub text: String,
}

/// One role-tagged element of the provider payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadContent {
    pub role: String,
    pub parts: Vec<PayloadPart>,
}

impl PayloadContent {
    pub fn new(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![PayloadPart { text: text.into() }],
        }
    }
}

/// Ordered payload sent through the proxy to the model provider.
pub type PromptPayload = Vec<PayloadContent>;

/// Label the provider expects for each transcript role. Assistant turns
/// are replayed as "model" turns.
fn provider_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Builds the outbound payload for one conversation turn.
///
/// The policy preamble always occupies the first element, carried with
/// role "user" because the provider accepts no dedicated system slot.
/// History follows in log order. Assembly never mutates the history and
/// the same history always yields the same payload.
#[derive(Clone, Debug)]
pub struct PromptAssembler {
    policy: String,
    history_limit: Option<usize>,
}

impl PromptAssembler {
    pub fn new(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            history_limit: None,
        }
    }

    /// Caps how many trailing history messages the payload carries. The
    /// policy preamble is never dropped, whatever the cap.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn policy(&self) -> &str {
        &self.policy
    }

    pub fn build(&self, history: &[Message]) -> PromptPayload {
        let tail = match self.history_limit {
            Some(limit) if history.len() > limit => &history[history.len() - limit..],
            _ => history,
        };
        let mut payload = Vec::with_capacity(tail.len() + 1);
        payload.push(PayloadContent::new("user", self.policy.clone()));
        for message in tail {
            payload.push(PayloadContent::new(provider_role(message.role), message.content.clone()));
        }
        payload
    }
}
