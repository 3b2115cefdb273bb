//! Remote command dispatch
//!
//! Commands are fire-and-report: the caller always gets a displayable
//! message back, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use md_core::AgentTransport;
use md_protocol::{CommandRequest, MouseButton, RemoteCommand};

use crate::session::Session;

/// Returned without touching the network when there is no session
pub const NOT_CONNECTED: &str = "Not connected to PC";

const DEFAULT_SUCCESS: &str = "Command executed successfully";
const DEFAULT_FAILURE: &str = "Command failed";

/// Sends commands to the connected agent
pub struct CommandDispatcher {
    session: Arc<Session>,
    transport: Arc<dyn AgentTransport>,
}

impl CommandDispatcher {
    pub fn new(session: Arc<Session>, transport: Arc<dyn AgentTransport>) -> Self {
        Self { session, transport }
    }

    /// Execute a command of type `kind` with `data`
    ///
    /// Returns the agent's message on success, its error on failure,
    /// `"Network error: ..."` if the request did not complete, or
    /// [`NOT_CONNECTED`].
    pub async fn execute(&self, kind: &str, data: HashMap<String, String>) -> String {
        self.dispatch(CommandRequest::new(kind, data)).await
    }

    /// Execute a typed command
    pub async fn send(&self, command: RemoteCommand) -> String {
        self.dispatch(command.into()).await
    }

    pub async fn send_mouse_click(&self, button: MouseButton) -> String {
        self.send(RemoteCommand::MouseClick { button, at: None })
            .await
    }

    pub async fn send_keyboard_shortcut(&self, shortcut: &str) -> String {
        self.send(RemoteCommand::KeyboardShortcut(shortcut.to_string()))
            .await
    }

    pub async fn send_system_command(&self, command: &str) -> String {
        self.send(RemoteCommand::SystemCommand(command.to_string()))
            .await
    }

    pub async fn open_app(&self, app_name: &str) -> String {
        self.send(RemoteCommand::OpenApp(app_name.to_string())).await
    }

    async fn dispatch(&self, request: CommandRequest) -> String {
        let Some(active) = self.session.active() else {
            tracing::debug!("Dropping {} command: not connected", request.kind);
            return NOT_CONNECTED.to_string();
        };

        tracing::debug!("Executing {} on {}", request.kind, active.endpoint);
        match self
            .transport
            .execute_command(&active.endpoint, &active.code, &request)
            .await
        {
            Ok(response) if response.success => response
                .message
                .unwrap_or_else(|| DEFAULT_SUCCESS.to_string()),
            Ok(response) => {
                let error = response
                    .error
                    .unwrap_or_else(|| DEFAULT_FAILURE.to_string());
                tracing::warn!("{} command failed: {}", request.kind, error);
                error
            }
            Err(e) => {
                tracing::warn!("{} command not delivered: {}", request.kind, e);
                format!("Network error: {}", e)
            }
        }
    }
}
