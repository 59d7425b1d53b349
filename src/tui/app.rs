// TUI application state
//
// App owns everything the screen needs that is not manager state: focus, the
// composer line, sidebar selection, the open modal and scroll position.
// Manager state is re-read into `chat` / `user` once per frame. Slow work
// (network calls) runs in spawned tasks that report back through AppEvent.

use super::input::InputLine;
use super::modal::{AuthRequest, Modal, ModalAction};
use crate::api::ClientError;
use crate::chat::{ChatState, SendOutcome};
use crate::logging::LogBuffer;
use crate::model::{AgentMode, UserProfile};
use crate::session::Session;
use crate::startup::Services;
use crate::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

/// Results of background work, delivered to the event loop
#[derive(Debug)]
pub enum AppEvent {
    /// Persisted-session check and first list load have settled.
    /// `expired` is set when a saved token was rejected.
    SessionReady { expired: bool },
    /// A login or register attempt finished
    AuthFinished {
        registered: bool,
        result: Result<Session, ClientError>,
    },
    SendFinished(SendOutcome),
    ConversationOpened { ok: bool },
}

/// Which pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    History,
    Agents,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Input => Focus::History,
            Focus::History => Focus::Agents,
            Focus::Agents => Focus::Input,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Input => Focus::Agents,
            Focus::History => Focus::Input,
            Focus::Agents => Focus::History,
        }
    }
}

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Main application state for the TUI
pub struct App {
    pub services: Services,
    pub theme: Theme,
    /// System logs; the status bar shows the latest problem
    pub log_buffer: LogBuffer,

    pub focus: Focus,
    pub input: InputLine,
    /// Highlighted row in the conversation list
    pub history_selected: usize,
    pub modal: Option<Modal>,
    pub should_quit: bool,

    /// Per-frame copies of manager state
    pub chat: ChatState,
    pub user: Option<UserProfile>,
    pub loading: bool,

    /// Lines scrolled up from the bottom of the transcript (0 = follow)
    pub transcript_scroll: usize,
    /// Upper bound for `transcript_scroll`, set by the last render
    pub transcript_max_scroll: usize,

    spinner_frame: usize,
    /// The demo-mode hint toast is raised once per run
    demo_hint_shown: bool,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        services: Services,
        theme: Theme,
        log_buffer: LogBuffer,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let mut app = Self {
            services,
            theme,
            log_buffer,
            focus: Focus::Input,
            input: InputLine::new(),
            history_selected: 0,
            modal: None,
            should_quit: false,
            chat: ChatState::default(),
            user: None,
            loading: true,
            transcript_scroll: 0,
            transcript_max_scroll: 0,
            spinner_frame: 0,
            demo_hint_shown: false,
            events,
        };
        app.refresh();
        app
    }

    /// Restore a saved session, then load its conversations
    pub fn start(&self) {
        let services = self.services.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let had_token = services.session.snapshot().token.is_some();
            services.session.check_persisted_session().await;
            let expired = had_token && !services.session.is_authenticated();
            services.chat.load_conversation_list().await;
            let _ = events.send(AppEvent::SessionReady { expired });
        });
    }

    /// Re-read manager state
    pub fn refresh(&mut self) {
        self.chat = self.services.chat.snapshot();
        self.user = self.services.session.user();
        self.loading = self.services.session.is_loading();

        let count = self.chat.conversations.len();
        if self.history_selected >= count {
            self.history_selected = count.saturating_sub(1);
        }
    }

    pub fn tick_animation(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
    }

    pub fn spinner_char(&self) -> char {
        SPINNER[self.spinner_frame]
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Keyboard
    // ─────────────────────────────────────────────────────────────────────

    /// Layered dispatch: Modal → Global → Focused pane
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.handle_modal_input(&key) {
            return;
        }
        if self.handle_global_keys(&key) {
            return;
        }
        // Nothing to interact with until the session check settles
        if self.loading {
            return;
        }
        match self.focus {
            Focus::Input => self.handle_input_keys(&key),
            Focus::History => self.handle_history_keys(&key),
            Focus::Agents => self.handle_agent_keys(&key),
        }
    }

    /// Returns true if a modal absorbed the input
    fn handle_modal_input(&mut self, key: &KeyEvent) -> bool {
        let Some(modal) = self.modal.as_mut() else {
            return false;
        };
        if is_quit(key) {
            self.should_quit = true;
            return true;
        }
        match modal.handle_input(key) {
            ModalAction::None => {}
            ModalAction::Close => self.modal = None,
            ModalAction::Submit(request) => self.submit_auth(request),
        }
        true
    }

    fn handle_global_keys(&mut self, key: &KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            _ if is_quit(key) => self.should_quit = true,
            KeyCode::Char('n') if ctrl && !self.loading => self.new_chat(),
            KeyCode::Char('l') if ctrl && !self.loading => self.toggle_sign_in(),
            KeyCode::F(1) => self.modal = Some(Modal::help()),
            KeyCode::Esc => {
                if let Some(id) = self.services.toasts.newest() {
                    self.services.toasts.dismiss(id);
                }
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::PageUp => self.scroll_transcript_up(10),
            KeyCode::PageDown => self.scroll_transcript_down(10),
            _ => return false,
        }
        true
    }

    fn handle_input_keys(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_message(),
            KeyCode::Up if self.input.text().is_empty() => self.scroll_transcript_up(1),
            KeyCode::Down if self.input.text().is_empty() => self.scroll_transcript_down(1),
            _ => {
                self.input.handle_key(key);
            }
        }
    }

    fn handle_history_keys(&mut self, key: &KeyEvent) {
        let count = self.chat.conversations.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.history_selected = self.history_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.history_selected + 1 < count {
                    self.history_selected += 1;
                }
            }
            KeyCode::Home => self.history_selected = 0,
            KeyCode::End => self.history_selected = count.saturating_sub(1),
            KeyCode::Enter => self.open_selected(),
            _ => {
                self.handle_agent_digit(key);
            }
        }
    }

    fn handle_agent_keys(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Up => self.pick_agent(self.chat.agent.prev()),
            KeyCode::Right | KeyCode::Down => self.pick_agent(self.chat.agent.next()),
            KeyCode::Enter => self.focus = Focus::Input,
            _ => {
                self.handle_agent_digit(key);
            }
        }
    }

    /// 1-4 pick an agent directly (outside the composer, where digits are text)
    fn handle_agent_digit(&mut self, key: &KeyEvent) -> bool {
        let KeyCode::Char(c @ '1'..='4') = key.code else {
            return false;
        };
        let index = (c as usize) - ('1' as usize);
        self.pick_agent(AgentMode::ALL[index]);
        true
    }

    fn scroll_transcript_up(&mut self, lines: usize) {
        self.transcript_scroll = (self.transcript_scroll + lines).min(self.transcript_max_scroll);
    }

    fn scroll_transcript_down(&mut self, lines: usize) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(lines);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────

    fn pick_agent(&mut self, mode: AgentMode) {
        self.services.chat.set_agent_mode(mode);
        self.chat.agent = mode;
    }

    fn new_chat(&mut self) {
        self.services.chat.start_new_conversation();
        self.transcript_scroll = 0;
        self.focus = Focus::Input;
        self.refresh();
    }

    fn submit_message(&mut self) {
        // Keep the draft while a reply is pending; sends are not queued
        if self.input.is_blank() || self.services.chat.is_sending() {
            return;
        }
        let text = self.input.take();
        self.transcript_scroll = 0;

        let chat = self.services.chat.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = chat.send_message(&text).await;
            let _ = events.send(AppEvent::SendFinished(outcome));
        });
    }

    fn open_selected(&mut self) {
        let Some(conv) = self.chat.conversations.get(self.history_selected) else {
            return;
        };
        let id = conv.id.clone();
        let chat = self.services.chat.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let ok = chat.open_conversation(&id).await;
            let _ = events.send(AppEvent::ConversationOpened { ok });
        });
    }

    /// Ctrl+L: sign in when signed out, sign out when signed in
    fn toggle_sign_in(&mut self) {
        if self.services.session.is_authenticated() {
            self.services.session.logout();
            self.services.chat.reset();
            self.services
                .toasts
                .ok("Signed Out", Some("See you next time!".to_string()));
            self.transcript_scroll = 0;
            self.refresh();
        } else {
            self.modal = Some(Modal::sign_in());
        }
    }

    fn submit_auth(&self, request: AuthRequest) {
        let session = self.services.session.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let (registered, result) = match request {
                AuthRequest::Login { email, password } => {
                    (false, session.login(&email, &password).await)
                }
                AuthRequest::Register {
                    email,
                    password,
                    name,
                } => (true, session.register(&email, &password, &name).await),
            };
            let _ = events.send(AppEvent::AuthFinished { registered, result });
        });
    }

    // ─────────────────────────────────────────────────────────────────────
    // Background results
    // ─────────────────────────────────────────────────────────────────────

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SessionReady { expired } => {
                if let Some(user) = self.services.session.user() {
                    tracing::info!("Restored session for {}", user.email);
                } else if expired {
                    self.services
                        .toasts
                        .warning("Session expired", Some("Please sign in again".to_string()));
                }
            }

            AppEvent::AuthFinished { registered, result } => match result {
                Ok(_) => {
                    self.modal = None;
                    let detail = if registered {
                        "Account created successfully"
                    } else {
                        "Signed in successfully"
                    };
                    self.services.toasts.ok("Welcome!", Some(detail.to_string()));

                    let chat = self.services.chat.clone();
                    tokio::spawn(async move {
                        chat.load_conversation_list().await;
                    });
                }
                Err(e) => match self.modal.as_mut().and_then(Modal::auth_form_mut) {
                    Some(form) => form.failed(e.to_string()),
                    // Modal was closed while the request ran
                    None => {
                        self.services.toasts.error("Sign in failed", Some(e.to_string()));
                    }
                },
            },

            AppEvent::SendFinished(SendOutcome::Failed(e)) => {
                let title = if e.is_transient() {
                    "Connection problem"
                } else {
                    "Message not sent"
                };
                self.services.toasts.error(title, Some(e.to_string()));
            }
            AppEvent::SendFinished(SendOutcome::Demo) if !self.demo_hint_shown => {
                self.demo_hint_shown = true;
                self.services.toasts.info(
                    "Demo mode",
                    Some("Press Ctrl+L to sign in for real answers".to_string()),
                );
            }
            AppEvent::SendFinished(_) => {}

            AppEvent::ConversationOpened { ok: true } => {
                self.transcript_scroll = 0;
                self.focus = Focus::Input;
            }
            AppEvent::ConversationOpened { ok: false } => {
                self.services.toasts.error("Could not open conversation", None);
            }
        }
        self.refresh();
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockTransport, MOCK_BASE};
    use crate::chat::{ChatOptions, ChatSession};
    use crate::notify::{NotificationQueue, ToastKind};
    use crate::session::{MemoryTokenStore, SessionStore, TokenStore};
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn app_with(mock: Arc<MockTransport>, token: Option<&str>) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let tokens: Arc<dyn TokenStore> = match token {
            Some(token) => Arc::new(MemoryTokenStore::with_token(token)),
            None => Arc::new(MemoryTokenStore::default()),
        };
        let session = SessionStore::new(MOCK_BASE, mock, tokens);
        let chat = ChatSession::new(session.clone(), ChatOptions::default());
        let services = Services {
            session,
            chat,
            toasts: NotificationQueue::default(),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(services, Theme::default(), LogBuffer::new(), tx), rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn profile() -> serde_json::Value {
        json!({"id": 7, "email": "asha@example.in", "full_name": "Asha Rao"})
    }

    async fn ready(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
        app.start();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::SessionReady { .. }));
        app.handle_app_event(event);
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn test_keys_ignored_while_loading() {
        let mock = MockTransport::new();
        let (mut app, _rx) = app_with(mock, None);
        assert!(app.loading);

        type_str(&mut app, "hi");
        app.handle_key(ctrl('l'));
        assert!(app.input.text().is_empty());
        assert!(app.modal.is_none());

        app.handle_key(ctrl('q'));
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_send_from_composer() {
        let mock = MockTransport::new();
        let (mut app, mut rx) = app_with(mock.clone(), None);
        ready(&mut app, &mut rx).await;

        type_str(&mut app, "Is an NDA enforceable?");
        app.handle_key(key(KeyCode::Enter));
        assert!(app.input.text().is_empty());

        tokio::time::advance(Duration::from_millis(1200)).await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::SendFinished(SendOutcome::Demo)));
        app.handle_app_event(event);

        assert_eq!(app.chat.transcript.len(), 2);
        assert!(mock.requests().is_empty());

        // A second demo answer does not repeat the hint
        type_str(&mut app, "And a non-compete?");
        app.handle_key(key(KeyCode::Enter));
        tokio::time::advance(Duration::from_millis(1200)).await;
        let event = rx.recv().await.unwrap();
        app.handle_app_event(event);

        let toasts = app.services.toasts.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Info);
        assert_eq!(toasts[0].title, "Demo mode");
    }

    #[tokio::test]
    async fn test_rejected_saved_session_warns() {
        let mock = MockTransport::new();
        mock.reply(Method::GET, "/auth/me", 401, json!({"detail": "Token expired"}));
        let (mut app, mut rx) = app_with(mock, Some("stale"));
        ready(&mut app, &mut rx).await;

        assert!(app.user.is_none());
        let toasts = app.services.toasts.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Warning);
        assert_eq!(toasts[0].title, "Session expired");
    }

    #[tokio::test]
    async fn test_first_run_without_token_is_quiet() {
        let mock = MockTransport::new();
        let (mut app, mut rx) = app_with(mock, None);
        ready(&mut app, &mut rx).await;
        assert!(app.services.toasts.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_raises_error_toast() {
        let mock = MockTransport::new();
        mock.reply(Method::GET, "/auth/me", 200, profile());
        mock.reply(Method::GET, "/chat/conversations", 200, json!([]));
        mock.reply(
            Method::POST,
            "/chat/messages",
            503,
            json!({"detail": "Model overloaded"}),
        );
        let (mut app, mut rx) = app_with(mock, Some("tok"));
        ready(&mut app, &mut rx).await;
        assert!(app.is_authenticated());

        type_str(&mut app, "hello");
        app.handle_key(key(KeyCode::Enter));
        let event = rx.recv().await.unwrap();
        app.handle_app_event(event);

        let toasts = app.services.toasts.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].title, "Connection problem");
        assert_eq!(toasts[0].message.as_deref(), Some("Model overloaded"));
    }

    #[tokio::test]
    async fn test_login_through_modal() {
        let mock = MockTransport::new();
        mock.reply(
            Method::POST,
            "/auth/login",
            200,
            json!({"access_token": "new-token", "user": profile()}),
        );
        mock.reply(Method::GET, "/chat/conversations", 200, json!([]));
        let (mut app, mut rx) = app_with(mock, None);
        ready(&mut app, &mut rx).await;

        app.handle_key(ctrl('l'));
        assert!(app.modal.is_some());
        type_str(&mut app, "asha@example.in");
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "secret");
        app.handle_key(key(KeyCode::Enter));

        let event = rx.recv().await.unwrap();
        app.handle_app_event(event);

        assert!(app.modal.is_none());
        assert!(app.is_authenticated());
        let toasts = app.services.toasts.toasts();
        assert_eq!(toasts[0].title, "Welcome!");
        assert_eq!(toasts[0].message.as_deref(), Some("Signed in successfully"));
    }

    #[tokio::test]
    async fn test_rejected_login_stays_in_modal() {
        let mock = MockTransport::new();
        mock.reply(
            Method::POST,
            "/auth/login",
            401,
            json!({"detail": "Incorrect email or password"}),
        );
        let (mut app, mut rx) = app_with(mock, None);
        ready(&mut app, &mut rx).await;

        app.handle_key(ctrl('l'));
        type_str(&mut app, "asha@example.in");
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, "wrong");
        app.handle_key(key(KeyCode::Enter));
        let event = rx.recv().await.unwrap();
        app.handle_app_event(event);

        let form = app.modal.as_mut().and_then(Modal::auth_form_mut).unwrap();
        assert_eq!(form.error.as_deref(), Some("Incorrect email or password"));
        assert!(!form.submitting);
        assert!(app.services.toasts.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_resets_chat() {
        let mock = MockTransport::new();
        mock.reply(Method::GET, "/auth/me", 200, profile());
        mock.reply(
            Method::GET,
            "/chat/conversations",
            200,
            json!([{"id": "c1", "title": "NDA", "message_count": 2}]),
        );
        let (mut app, mut rx) = app_with(mock, Some("tok"));
        ready(&mut app, &mut rx).await;
        assert_eq!(app.chat.conversations.len(), 1);

        app.handle_key(ctrl('l'));

        assert!(!app.is_authenticated());
        assert!(app.chat.conversations.is_empty());
        assert!(app.modal.is_none());
        assert_eq!(app.services.toasts.toasts()[0].title, "Signed Out");
    }

    #[tokio::test]
    async fn test_agent_picker_and_focus_cycle() {
        let mock = MockTransport::new();
        let (mut app, mut rx) = app_with(mock, None);
        ready(&mut app, &mut rx).await;

        // Digits are text in the composer
        type_str(&mut app, "3");
        assert_eq!(app.input.text(), "3");
        assert_eq!(app.chat.agent, AgentMode::General);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::History);
        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.services.chat.agent_mode(), AgentMode::Compliance);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Agents);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.services.chat.agent_mode(), AgentMode::Risk);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.services.chat.agent_mode(), AgentMode::General);

        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus, Focus::History);
    }

    #[tokio::test]
    async fn test_esc_dismisses_newest_toast() {
        let mock = MockTransport::new();
        let (mut app, mut rx) = app_with(mock, None);
        ready(&mut app, &mut rx).await;

        app.services.toasts.info("first", None);
        app.services.toasts.info("second", None);
        app.handle_key(key(KeyCode::Esc));

        let titles: Vec<_> = app
            .services
            .toasts
            .toasts()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["first"]);
    }

    #[tokio::test]
    async fn test_open_conversation_from_history() {
        let mock = MockTransport::new();
        mock.reply(Method::GET, "/auth/me", 200, profile());
        mock.reply(
            Method::GET,
            "/chat/conversations",
            200,
            json!([
                {"id": "c1", "title": "NDA"},
                {"id": "c2", "title": "GST"}
            ]),
        );
        mock.reply(
            Method::GET,
            "/chat/conversations/c2",
            200,
            json!({
                "id": "c2",
                "title": "GST",
                "agent_type": "compliance",
                "messages": [{"id": 1, "role": "user", "content": "GST due dates?"}]
            }),
        );
        let (mut app, mut rx) = app_with(mock, Some("tok"));
        ready(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.history_selected, 1);
        app.handle_key(key(KeyCode::Enter));

        let event = rx.recv().await.unwrap();
        app.handle_app_event(event);

        assert_eq!(app.focus, Focus::Input);
        assert_eq!(app.chat.current.as_ref().map(|c| c.id.as_str()), Some("c2"));
        assert_eq!(app.chat.agent, AgentMode::Compliance);
        assert_eq!(app.chat.transcript.len(), 1);
    }
}
