use std::sync::{ Arc, Mutex };

use log::{ debug, info, warn };
use uuid::Uuid;

use crate::conversation::ConversationStore;
use crate::models::chat::{ Message, Role, SessionView };
use crate::prompt::PromptAssembler;
use crate::proxy::{ ProxyClient, ProxyError };

/// Assistant text shown when the proxy answered without a usable reply.
pub const FALLBACK_NO_REPLY: &str = "Sorry, I couldn't get a reply.";
/// Assistant text shown when the round-trip failed outright.
pub const FALLBACK_UNREACHABLE: &str = "Error: Could not reach the service.";

/// Request lifecycle of a session. `Pending` covers exactly the window
/// between dispatching a payload and settling its reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Pending,
}

/// What became of one `submit` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The turn ran to completion: a user message and an assistant
    /// message (reply or fallback) were appended.
    Completed,
    /// Input was empty or whitespace-only. Nothing changed.
    IgnoredEmpty,
    /// A request was already in flight. The call was dropped, not queued.
    IgnoredBusy,
}

struct SessionInner {
    store: ConversationStore,
    state: RequestState,
}

/// One widget conversation: the message log plus the request lifecycle
/// around each proxy round-trip.
///
/// At most one round-trip runs at a time. A `submit` arriving while one
/// is pending is dropped outright, so replies can never interleave with
/// user turns out of order. Every accepted user message is answered by
/// exactly one assistant message, a fixed fallback when the round-trip
/// fails.
pub struct ChatSession {
    id: String,
    inner: Arc<Mutex<SessionInner>>,
    assembler: PromptAssembler,
    client: Arc<dyn ProxyClient>,
}

impl ChatSession {
    pub fn new(client: Arc<dyn ProxyClient>, assembler: PromptAssembler) -> Self {
        let id = Uuid::new_v4().to_string();
        info!("Starting chat session {}", id);
        Self {
            id,
            inner: Arc::new(
                Mutex::new(SessionInner {
                    store: ConversationStore::new(),
                    state: RequestState::Idle,
                })
            ),
            assembler,
            client,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Runs one conversation turn.
    ///
    /// Validates the input, appends the user message, sends the assembled
    /// payload through the proxy client and appends the reply, or the
    /// fallback text when the round-trip fails or yields blank text. The
    /// await on the proxy call is the only suspension point; the session
    /// lock is never held across it.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("Session {}: ignoring empty input", self.id);
            return SubmitOutcome::IgnoredEmpty;
        }

        // The busy check, the user append and the payload build happen
        // under one lock so the payload always ends with the message that
        // triggered it and a concurrent submit observes Pending.
        let payload = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state == RequestState::Pending {
                info!("Session {}: dropping input while a request is pending", self.id);
                return SubmitOutcome::IgnoredBusy;
            }
            if inner.store.append(Role::User, trimmed).is_err() {
                // unreachable: trimmed input is non-empty
                return SubmitOutcome::IgnoredEmpty;
            }
            inner.state = RequestState::Pending;
            self.assembler.build(inner.store.messages())
        };
        let guard = PendingGuard::arm(Arc::clone(&self.inner));

        let result = self.client.send(&payload).await;

        {
            let mut inner = self.inner.lock().unwrap();
            let reply = match result {
                Ok(text) if !text.trim().is_empty() => {
                    debug!("Session {}: reply received ({} chars)", self.id, text.len());
                    text
                }
                Ok(_) => {
                    warn!("Session {}: blank reply from the proxy", self.id);
                    FALLBACK_NO_REPLY.to_string()
                }
                Err(err) => {
                    warn!("Session {}: round-trip failed: {}", self.id, err);
                    fallback_for(&err).to_string()
                }
            };
            // The reply append and the return to Idle settle together.
            if inner.store.append(Role::Assistant, &reply).is_err() {
                // unreachable: every arm above yields non-blank text
                warn!("Session {}: dropped blank assistant reply", self.id);
            }
            inner.state = RequestState::Idle;
        }
        guard.disarm();
        SubmitOutcome::Completed
    }

    /// Transcript and pending flag, read in one atomic observation.
    pub fn view(&self) -> SessionView {
        let inner = self.inner.lock().unwrap();
        SessionView {
            messages: inner.store.snapshot(),
            pending: inner.state == RequestState::Pending,
        }
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.inner.lock().unwrap().store.snapshot()
    }

    pub fn state(&self) -> RequestState {
        self.inner.lock().unwrap().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == RequestState::Pending
    }
}

/// Maps a round-trip failure to the assistant text shown for it. A proxy
/// that answered without a usable reply, an error status included, reads
/// differently from one that could not be reached or understood at all.
fn fallback_for(err: &ProxyError) -> &'static str {
    match err {
        ProxyError::EmptyReply | ProxyError::Api { .. } => FALLBACK_NO_REPLY,
        ProxyError::Transport(_) | ProxyError::InvalidBody(_) => FALLBACK_UNREACHABLE,
    }
}

/// Returns the session to `Idle` when dropped, so no exit path out of a
/// round-trip can leave it stuck in `Pending`.
struct PendingGuard {
    inner: Arc<Mutex<SessionInner>>,
    armed: bool,
}

impl PendingGuard {
    fn arm(inner: Arc<Mutex<SessionInner>>) -> Self {
        Self { inner, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // A poisoned lock means the holder panicked; skip rather than
        // panic again in drop.
        if let Ok(mut inner) = self.inner.lock() {
            inner.state = RequestState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_text_depends_on_whether_the_proxy_answered() {
        assert_eq!(fallback_for(&ProxyError::EmptyReply), FALLBACK_NO_REPLY);

        // An error status is still an answer, just one without a reply.
        let api = ProxyError::Api { status: 500, message: "boom".to_string() };
        assert_eq!(fallback_for(&api), FALLBACK_NO_REPLY);

        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert_eq!(fallback_for(&ProxyError::InvalidBody(json_err)), FALLBACK_UNREACHABLE);
    }

    #[test]
    fn pending_guard_releases_on_drop() {
        let inner = Arc::new(
            Mutex::new(SessionInner {
                store: ConversationStore::new(),
                state: RequestState::Pending,
            })
        );
        drop(PendingGuard::arm(Arc::clone(&inner)));
        assert_eq!(inner.lock().unwrap().state, RequestState::Idle);
    }

    #[test]
    fn disarmed_guard_leaves_state_alone() {
        let inner = Arc::new(
            Mutex::new(SessionInner {
                store: ConversationStore::new(),
                state: RequestState::Pending,
            })
        );
        PendingGuard::arm(Arc::clone(&inner)).disarm();
        assert_eq!(inner.lock().unwrap().state, RequestState::Pending);
    }
}
