//! Message routing between a front end and the session.

use crate::content::TIP_TEXT;
use crate::session::GameSession;
use std::sync::Arc;
use tracing::debug;

/// One exchange of chat history as the front end keeps it: (player, narrator).
pub type ChatTurn = (String, String);

/// Single entry point for front ends.
#[derive(Clone, Default)]
pub struct Router {
    session: Option<Arc<GameSession>>,
}

impl Router {
    pub fn new(session: Arc<GameSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// A router with no session; every message gets the not-ready notice.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, session: Arc<GameSession>) {
        self.session = Some(session);
    }

    pub fn ready(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Arc<GameSession>> {
        self.session.as_ref()
    }

    /// Handle one player message.
    ///
    /// `history` is the front end's chat transcript. The narrator works from
    /// the game log instead, so it is accepted but not used.
    pub async fn handle(&self, message: &str, history: &[ChatTurn]) -> String {
        let Some(session) = &self.session else {
            return "⚠️ Game session is not ready: no narrator runtime is attached.".to_string();
        };

        let text = message.trim();
        if text.is_empty() {
            return format!("Say something like: {TIP_TEXT}");
        }

        debug!(history = history.len(), "routing message");
        session.respond(text).await
    }
}
