//! Login form

use std::sync::Arc;

use crate::session::{LoginOutcome, SessionService};
use crate::shell::{Navigator, Notifier, Route};

pub const MISSING_FIELDS: &str = "Por favor completa todos los campos";
pub const LOGIN_FAILED: &str = "Error al iniciar sesión";

/// What happened to a form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginSubmission {
    /// A field was empty; nothing was sent
    Incomplete,
    LoggedIn,
    Rejected(String),
    Failed,
}

pub struct LoginScreen {
    session: Arc<SessionService>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl LoginScreen {
    pub fn new(
        session: Arc<SessionService>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            navigator,
            notifier,
        }
    }

    pub async fn submit(&self, usuario: &str, contrasena: &str) -> LoginSubmission {
        if usuario.is_empty() || contrasena.is_empty() {
            self.notifier.alert(MISSING_FIELDS);
            return LoginSubmission::Incomplete;
        }

        match self.session.login(usuario, contrasena).await {
            Ok(LoginOutcome::Authenticated { .. }) => {
                self.navigator.navigate(Route::Dashboard);
                LoginSubmission::LoggedIn
            }
            Ok(LoginOutcome::Rejected { message, .. }) => {
                self.notifier.alert(&message);
                LoginSubmission::Rejected(message)
            }
            Err(e) => {
                tracing::error!("Login failed: {}", e);
                self.notifier.alert(LOGIN_FAILED);
                LoginSubmission::Failed
            }
        }
    }
}
