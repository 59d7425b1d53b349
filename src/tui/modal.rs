// Modal system for TUI overlays
//
// Self-contained modal dialogs that handle their own input and return actions.
// App just holds Option<Modal>, input routing acts on returned ModalAction.

use super::input::InputLine;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Actions returned by modal input handling
#[derive(Debug, Clone, PartialEq)]
pub enum ModalAction {
    /// Input consumed, no state change needed
    None,
    /// Close the modal
    Close,
    /// Credentials are complete; run the request
    Submit(AuthRequest),
}

/// What the auth form asks the session store to do
#[derive(Debug, Clone, PartialEq)]
pub enum AuthRequest {
    Login {
        email: String,
        password: String,
    },
    Register {
        email: String,
        password: String,
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Password,
}

/// Sign-in / sign-up form
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub name: InputLine,
    pub email: InputLine,
    pub password: InputLine,
    pub focus: AuthField,
    /// Last failure, shown under the fields
    pub error: Option<String>,
    /// A request is in flight; fields are frozen
    pub submitting: bool,
}

impl AuthForm {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            name: InputLine::new(),
            email: InputLine::new(),
            password: InputLine::masked(),
            focus: Self::fields(mode)[0],
            error: None,
            submitting: false,
        }
    }

    /// Fields in tab order
    pub fn fields(mode: AuthMode) -> &'static [AuthField] {
        match mode {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::Register => &[AuthField::Name, AuthField::Email, AuthField::Password],
        }
    }

    pub fn field(&self, field: AuthField) -> &InputLine {
        match field {
            AuthField::Name => &self.name,
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
        }
    }

    fn focused_mut(&mut self) -> &mut InputLine {
        match self.focus {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    fn step_focus(&mut self, forward: bool) {
        let fields = Self::fields(self.mode);
        let at = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (at + 1) % fields.len()
        } else {
            (at + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    /// Flip between sign in and create account, keeping what was typed
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.error = None;
        // Registering starts at the top of the form
        if self.mode == AuthMode::Register || !Self::fields(self.mode).contains(&self.focus) {
            self.focus = Self::fields(self.mode)[0];
        }
    }

    fn is_last_field(&self) -> bool {
        Self::fields(self.mode).last() == Some(&self.focus)
    }

    /// Build the request, or record why the form is incomplete
    fn request(&mut self) -> Option<AuthRequest> {
        let email = self.email.text().trim().to_string();
        let password = self.password.text().to_string();
        let name = self.name.text().trim().to_string();

        let missing = email.is_empty()
            || password.is_empty()
            || (self.mode == AuthMode::Register && name.is_empty());
        if missing {
            self.error = Some("Please fill in every field".to_string());
            return None;
        }

        self.error = None;
        Some(match self.mode {
            AuthMode::Login => AuthRequest::Login { email, password },
            AuthMode::Register => AuthRequest::Register {
                email,
                password,
                name,
            },
        })
    }

    /// The request failed; let the user edit and retry
    pub fn failed(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
        self.password.clear();
        self.focus = AuthField::Password;
    }

    fn handle_input(&mut self, key: &KeyEvent) -> ModalAction {
        if key.code == KeyCode::Esc {
            return ModalAction::Close;
        }
        if self.submitting {
            return ModalAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('r') if ctrl => self.toggle_mode(),
            KeyCode::Tab | KeyCode::Down => self.step_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.step_focus(false),
            KeyCode::Enter if !self.is_last_field() => self.step_focus(true),
            KeyCode::Enter => {
                if let Some(request) = self.request() {
                    self.submitting = true;
                    return ModalAction::Submit(request);
                }
            }
            _ => {
                self.focused_mut().handle_key(key);
            }
        }
        ModalAction::None
    }
}

/// Available modal types
#[derive(Debug, Clone)]
pub enum Modal {
    /// Keyboard shortcuts
    Help,
    /// Sign in or create an account
    Auth(AuthForm),
}

impl Modal {
    pub fn help() -> Self {
        Modal::Help
    }

    pub fn sign_in() -> Self {
        Modal::Auth(AuthForm::new(AuthMode::Login))
    }

    /// Handle keyboard input, return action for caller to execute
    pub fn handle_input(&mut self, key: &KeyEvent) -> ModalAction {
        match self {
            Modal::Help => match key.code {
                KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter => ModalAction::Close,
                _ => ModalAction::None,
            },
            Modal::Auth(form) => form.handle_input(key),
        }
    }

    pub fn auth_form_mut(&mut self) -> Option<&mut AuthForm> {
        match self {
            Modal::Auth(form) => Some(form),
            Modal::Help => None,
        }
    }
}
