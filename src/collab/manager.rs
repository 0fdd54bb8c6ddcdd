//! One-shot connection to the collaboration server.
//!
//! A failed connection never stops the agent: after the retry budget is spent
//! the manager reports `Degraded` and the agent runs on built-in tools only.

use crate::collab::{Connector, RemoteSession, RemoteTool, RetryPolicy, Sleeper};
use crate::error::CollabError;
use crate::tools::Tool;
use crate::types::ConnectionState;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a `connect` call.
pub struct ConnectionOutcome {
    pub state: ConnectionState,
    pub remote_tools: Vec<Arc<dyn Tool>>,
    /// Handshakes attempted by this call.
    pub attempts: u32,
}

impl std::fmt::Debug for ConnectionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionOutcome")
            .field("state", &self.state)
            .field(
                "remote_tools",
                &self.remote_tools.iter().map(|t| &t.spec().name).collect::<Vec<_>>(),
            )
            .field("attempts", &self.attempts)
            .finish()
    }
}

pub struct ConnectionManager {
    policy: RetryPolicy,
    connector: Arc<dyn Connector>,
    sleeper: Arc<dyn Sleeper>,
    state: ConnectionState,
    session: Option<Arc<dyn RemoteSession>>,
    attempted: bool,
}

impl ConnectionManager {
    pub fn new(policy: RetryPolicy, connector: Arc<dyn Connector>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy,
            connector,
            sleeper,
            state: ConnectionState::Disconnected,
            session: None,
            attempted: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The live session, once connected.
    pub fn session(&self) -> Option<Arc<dyn RemoteSession>> {
        self.session.clone()
    }

    /// Connect to `endpoint` and wrap its tools.
    ///
    /// An absent or blank endpoint leaves the manager `Disconnected` without
    /// any attempt. Only the first call does any work.
    pub async fn connect(&mut self, endpoint: Option<&str>) -> ConnectionOutcome {
        if self.attempted {
            warn!("Connection already attempted (state: {}); ignoring", self.state);
            return self.outcome(Vec::new(), 0);
        }
        self.attempted = true;

        let Some(url) = endpoint.map(str::trim).filter(|u| !u.is_empty()) else {
            info!("No collaboration endpoint configured; running standalone");
            return self.outcome(Vec::new(), 0);
        };

        self.state = ConnectionState::Connecting;
        let max = self.policy.max_attempts.max(1);

        for attempt in 1..=max {
            match self.handshake(url).await {
                Ok((session, tools)) => {
                    info!(
                        "Connected to collaboration server ({} remote tools)",
                        tools.len()
                    );
                    self.state = ConnectionState::Connected;
                    self.session = Some(session);
                    return self.outcome(tools, attempt);
                }
                Err(e) => {
                    warn!("Connection failed (attempt {}/{}): {}", attempt, max, e);
                    if let Some(delay) = self.policy.delay_after(attempt) {
                        self.sleeper.sleep(delay).await;
                    }
                }
            }
        }

        warn!(
            "Could not reach the collaboration server after {} attempts; continuing with built-in tools only",
            max
        );
        self.state = ConnectionState::Degraded;
        self.outcome(Vec::new(), max)
    }

    async fn handshake(
        &self,
        url: &str,
    ) -> Result<(Arc<dyn RemoteSession>, Vec<Arc<dyn Tool>>), CollabError> {
        let session = self.connector.connect(url).await?;
        let tools = session
            .list_tools()
            .await?
            .iter()
            .map(|info| Arc::new(RemoteTool::new(session.clone(), info)) as Arc<dyn Tool>)
            .collect();
        Ok((session, tools))
    }

    fn outcome(&self, remote_tools: Vec<Arc<dyn Tool>>, attempts: u32) -> ConnectionOutcome {
        ConnectionOutcome {
            state: self.state,
            remote_tools,
            attempts,
        }
    }
}
