//! Chat session manager
//!
//! Owns the conversation list, the active conversation, its transcript, the
//! selected agent mode and the "sending" flag. The UI reads snapshots and
//! calls the async operations from background tasks; state lives behind a
//! mutex that is never held across an `.await`.
//!
//! ```text
//!   send_message ──▶ Idle ──(flag set)──▶ Sending ──(settled)──▶ Idle
//!                                │
//!                                └─ further sends are ignored, not queued
//! ```

mod demo;
mod transcript;

pub use demo::demo_reply;
pub use transcript::{Delivery, Transcript, TranscriptEntry};

use crate::api::wire::{self, SendMessageBody, SentMessage};
use crate::api::ClientError;
use crate::model::{AgentMode, ConversationDetail, ConversationSummary, Message, Role};
use crate::session::SessionStore;
use crate::util::Sequence;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

/// Simulated round trip for demo replies
pub const DEFAULT_DEMO_DELAY: Duration = Duration::from_millis(1200);

/// The conversation whose transcript is on screen
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConversation {
    pub id: String,
    pub title: Option<String>,
    pub agent_mode: Option<AgentMode>,
}

/// Everything the UI renders from the chat manager
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub conversations: Vec<ConversationSummary>,
    pub current: Option<CurrentConversation>,
    pub transcript: Transcript,
    pub agent: AgentMode,
    pub sending: bool,
}

/// What became of a `send_message` call
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank text, or another send was still in flight
    Ignored,
    /// Backend stored the message and replied
    Delivered,
    /// Signed out: answered locally with the demo reply
    Demo,
    /// Backend call failed; an error notice was added to the transcript
    Failed(ClientError),
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub demo_delay: Duration,
    pub initial_agent: AgentMode,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            demo_delay: DEFAULT_DEMO_DELAY,
            initial_agent: AgentMode::default(),
        }
    }
}

struct Inner {
    session: SessionStore,
    state: Arc<Mutex<ChatState>>,
    /// Delayed work (demo replies) to abort on teardown
    scheduled: Mutex<Vec<AbortHandle>>,
    local_ids: Sequence,
    demo_delay: Duration,
}

impl Inner {
    fn abort_scheduled(&self) {
        let mut scheduled = self
            .scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for handle in scheduled.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.abort_scheduled();
    }
}

fn lock(state: &Mutex<ChatState>) -> MutexGuard<'_, ChatState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the sending flag however `send_message` exits
struct SendingGuard {
    state: Arc<Mutex<ChatState>>,
}

impl Drop for SendingGuard {
    fn drop(&mut self) {
        lock(&self.state).sending = false;
    }
}

/// Shared handle to one chat session; clones operate on the same state
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<Inner>,
}

impl ChatSession {
    pub fn new(session: SessionStore, options: ChatOptions) -> Self {
        let state = ChatState {
            agent: options.initial_agent,
            ..Default::default()
        };

        Self {
            inner: Arc::new(Inner {
                session,
                state: Arc::new(Mutex::new(state)),
                scheduled: Mutex::new(Vec::new()),
                local_ids: Sequence::new(),
                demo_delay: options.demo_delay,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        lock(&self.inner.state)
    }

    /// Timestamp-based id for messages built on this side
    fn local_id(&self) -> String {
        format!(
            "local-{}-{}",
            Utc::now().timestamp_millis(),
            self.inner.local_ids.next_value()
        )
    }

    fn track(&self, handle: AbortHandle) {
        let mut scheduled = self
            .inner
            .scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        scheduled.retain(|h| !h.is_finished());
        scheduled.push(handle);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read side
    // ─────────────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> ChatState {
        self.lock().clone()
    }

    pub fn is_sending(&self) -> bool {
        self.lock().sending
    }

    #[cfg(test)]
    pub fn agent_mode(&self) -> AgentMode {
        self.lock().agent
    }

    // ─────────────────────────────────────────────────────────────────────
    // Conversations
    // ─────────────────────────────────────────────────────────────────────

    /// Refresh the sidebar list. No-op when signed out; failures keep the
    /// previous list. Returns whether the list was replaced.
    pub async fn load_conversation_list(&self) -> bool {
        if !self.inner.session.is_authenticated() {
            return false;
        }

        match self
            .inner
            .session
            .get_json::<Vec<ConversationSummary>>(wire::CONVERSATIONS_PATH)
            .await
        {
            Ok(list) => {
                tracing::debug!("Loaded {} conversations", list.len());
                self.lock().conversations = list;
                true
            }
            Err(e) => {
                tracing::warn!("Failed to load conversations: {}", e);
                false
            }
        }
    }

    /// Load a conversation and make it current. Failures leave the previous
    /// conversation on screen. Returns whether the switch happened.
    pub async fn open_conversation(&self, id: &str) -> bool {
        match self
            .inner
            .session
            .get_json::<ConversationDetail>(&wire::conversation_path(id))
            .await
        {
            Ok(detail) => {
                let mut state = self.lock();
                if let Some(mode) = detail.agent_mode {
                    state.agent = mode;
                }
                state.current = Some(CurrentConversation {
                    id: detail.id,
                    title: detail.title,
                    agent_mode: detail.agent_mode,
                });
                state.transcript.replace(detail.messages);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to load conversation {}: {}", id, e);
                false
            }
        }
    }

    /// Blank slate. The backend creates the conversation on the first send.
    pub fn start_new_conversation(&self) {
        let mut state = self.lock();
        state.current = None;
        state.transcript.clear();
    }

    /// Future messages use `mode`; past messages keep theirs
    pub fn set_agent_mode(&self, mode: AgentMode) {
        self.lock().agent = mode;
    }

    /// Drop everything tied to the signed-in user (used on sign-out)
    pub fn reset(&self) {
        let mut state = self.lock();
        state.conversations.clear();
        state.current = None;
        state.transcript.clear();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sending
    // ─────────────────────────────────────────────────────────────────────

    /// Send `text` in the current conversation.
    ///
    /// The user message shows up immediately. Signed in, it goes to the
    /// backend and the reply is appended (or an error notice on failure).
    /// Signed out, a demo reply is appended after the demo delay. Only one
    /// send runs at a time; calls made meanwhile are ignored.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let content = text.trim();
        if content.is_empty() {
            return SendOutcome::Ignored;
        }

        let (local_id, agent, conversation_id) = {
            let mut state = self.lock();
            if state.sending {
                tracing::debug!("Send already in progress, ignoring");
                return SendOutcome::Ignored;
            }
            state.sending = true;

            let agent = state.agent;
            let local_id = self.local_id();
            state.transcript.push_pending(Message::local(
                local_id.clone(),
                Role::User,
                content,
                agent,
            ));
            (local_id, agent, state.current.as_ref().map(|c| c.id.clone()))
        };
        let guard = SendingGuard {
            state: Arc::clone(&self.inner.state),
        };

        if !self.inner.session.is_authenticated() {
            self.lock().transcript.keep_local(&local_id);
            self.reply_in_demo_mode(content.to_string(), agent).await;
            drop(guard);
            return SendOutcome::Demo;
        }

        let body = SendMessageBody {
            content,
            conversation_id: conversation_id.as_deref(),
            agent_type: agent,
        };
        let result = self
            .inner
            .session
            .post_json::<SentMessage, _>(wire::MESSAGES_PATH, &body)
            .await;

        match result {
            Ok(SentMessage {
                conversation_id: assigned_id,
                message,
            }) => {
                // First message of a new conversation: adopt the backend's id
                // right away so a failed reload cannot fork a second one
                let adopted = assigned_id.filter(|_| conversation_id.is_none());
                {
                    let mut state = self.lock();
                    state.transcript.confirm(&local_id);
                    state.transcript.push_confirmed(message);
                    if let Some(id) = &adopted {
                        if state.current.is_none() {
                            state.current = Some(CurrentConversation {
                                id: id.clone(),
                                title: None,
                                agent_mode: Some(agent),
                            });
                        }
                    }
                }
                drop(guard);

                if let Some(id) = adopted {
                    self.open_conversation(&id).await;
                }
                self.load_conversation_list().await;
                SendOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(status = ?e.status(), "Failed to send message: {}", e);
                let notice = Message::local(
                    self.local_id(),
                    Role::Assistant,
                    format!("**Error:** {}. Please try again.", e),
                    agent,
                );
                {
                    let mut state = self.lock();
                    state.transcript.fail(&local_id);
                    state.transcript.push_local(notice);
                }
                drop(guard);
                SendOutcome::Failed(e)
            }
        }
    }

    async fn reply_in_demo_mode(&self, content: String, agent: AgentMode) {
        let state = Arc::clone(&self.inner.state);
        let delay = self.inner.demo_delay;
        let reply_id = self.local_id();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let reply = Message::local(
                reply_id,
                Role::Assistant,
                demo_reply(&content, agent),
                agent,
            );
            lock(&state).transcript.push_local(reply);
        });
        self.track(handle.abort_handle());

        if let Err(e) = handle.await {
            if e.is_cancelled() {
                tracing::debug!("Demo reply cancelled");
            } else {
                tracing::error!("Demo reply task failed: {}", e);
            }
        }
    }

    /// Abort delayed work. Safe to call more than once.
    pub fn shutdown(&self) {
        self.inner.abort_scheduled();
    }
}
