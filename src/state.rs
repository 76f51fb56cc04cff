use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::gateway::GatewayClient;
use crate::session::{Action, Effect, SessionState};

pub struct AppState {
    pub gateway: Arc<GatewayClient>,
    /// One hunting session per Discord user.
    pub sessions: RwLock<HashMap<u64, SessionState>>,
}

impl AppState {
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self {
            gateway,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Run `f` against the user's session, creating it on first use.
    pub async fn with_session<R>(&self, user_id: u64, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut sessions = self.sessions.write().await;
        f(sessions.entry(user_id).or_default())
    }

    /// Apply an action and carry out any submission it asks for. The session
    /// lock is released while the gateway call is pending.
    pub async fn dispatch(&self, user_id: u64, action: Action) {
        let effect = self.with_session(user_id, |s| s.update(action)).await;
        if let Effect::Submit {
            generation,
            records,
            cancel,
        } = effect
        {
            let result = self.gateway.submit(&records, &cancel).await;
            self.with_session(user_id, |s| {
                s.update(Action::Completed { generation, result })
            })
            .await;
        }
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
