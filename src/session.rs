//! Per-user navigation state for the workshop → machine menu.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::{ChatId, UserId};

use crate::config::WorkshopRegistry;
use crate::errors::LookupError;

/// Where a user is in the menu
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    AwaitingWorkshop,
    AwaitingMachine {
        workshop: String,
    },
}

impl SessionState {
    pub fn selected_workshop(&self) -> Option<&str> {
        match self {
            SessionState::AwaitingWorkshop => None,
            SessionState::AwaitingMachine { workshop } => Some(workshop),
        }
    }
}

/// Session store. Any teloxide dialogue `Storage` can replace it.
pub type SessionStorage = InMemStorage<SessionState>;

/// Handle on one user's session
pub type Session = Dialogue<SessionState, SessionStorage>;

/// Open the session of `user`. Sessions are keyed by user, not by chat.
pub fn session_for(storage: std::sync::Arc<SessionStorage>, user: UserId) -> Session {
    Session::new(storage, ChatId::from(user))
}

/// Current state, `AwaitingWorkshop` for a user seen for the first time
pub async fn current(session: &Session) -> Result<SessionState> {
    Ok(session.get().await?.unwrap_or_default())
}

/// Reset to workshop selection
pub async fn start(session: &Session) -> Result<()> {
    session.update(SessionState::AwaitingWorkshop).await?;
    Ok(())
}

/// Remember `name` and move to machine selection.
///
/// Unknown names fail with [`LookupError::UnknownWorkshop`] and leave the
/// session untouched.
pub async fn select_workshop(
    session: &Session,
    workshops: &WorkshopRegistry,
    name: &str,
) -> Result<()> {
    if !workshops.contains(name) {
        return Err(LookupError::UnknownWorkshop(name.to_string()).into());
    }
    session
        .update(SessionState::AwaitingMachine {
            workshop: name.to_string(),
        })
        .await?;
    Ok(())
}

/// Return to workshop selection, forgetting the selected workshop
pub async fn go_back(session: &Session) -> Result<()> {
    session.update(SessionState::AwaitingWorkshop).await?;
    Ok(())
}
