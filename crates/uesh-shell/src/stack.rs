//! The LIFO stack of shell sessions.
//!
//! The root session is stored apart from the nested ones, so the stack is
//! never empty and the root can never be popped.

use uesh_types::kind::ShellType;

use crate::session::{SessionId, ShellSession};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Top of the stack, receiving input.
    Active,
    /// Below the top, retained.
    Suspended,
    /// Popped.
    Terminated,
}

/// Result of [`ShellStack::pop`].
#[derive(Debug)]
pub enum PopOutcome {
    /// The active session was removed and terminated.
    Popped(ShellSession),
    /// Depth was 1; nothing was removed and the caller should shut down.
    Shutdown,
}

#[derive(Debug)]
pub struct ShellStack {
    root: ShellSession,
    nested: Vec<ShellSession>,
    next_id: u64,
}

impl ShellStack {
    /// A stack holding only a root session of `root_type`.
    pub fn new(root_type: ShellType, cwd: impl Into<String>) -> Self {
        Self {
            root: ShellSession::new(SessionId(0), root_type, cwd.into()),
            nested: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of sessions, as shown in the prompt.
    pub fn depth(&self) -> usize {
        self.nested.len() + 1
    }

    pub fn active(&self) -> &ShellSession {
        self.nested.last().unwrap_or(&self.root)
    }

    pub fn active_mut(&mut self) -> &mut ShellSession {
        self.nested.last_mut().unwrap_or(&mut self.root)
    }

    pub fn root(&self) -> &ShellSession {
        &self.root
    }

    /// Push a new session of `shell_type`. It inherits the working
    /// directory of the session it suspends.
    pub fn push(&mut self, shell_type: ShellType) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        let cwd = self.active().cwd.clone();
        self.nested.push(ShellSession::new(id, shell_type, cwd));
        log::info!("entered {shell_type} shell {id} (depth {})", self.depth());
        id
    }

    /// Terminate the active session. At depth 1 nothing is popped.
    pub fn pop(&mut self) -> PopOutcome {
        match self.nested.pop() {
            Some(session) => {
                log::info!(
                    "left {} shell {} (depth {})",
                    session.shell_type(),
                    session.id(),
                    self.depth()
                );
                PopOutcome::Popped(session)
            },
            None => {
                log::info!("exit at the root shell; shutdown requested");
                PopOutcome::Shutdown
            },
        }
    }

    /// State of the session with `id`, or `None` if it never existed.
    pub fn state_of(&self, id: SessionId) -> Option<SessionState> {
        if id.0 >= self.next_id {
            return None;
        }
        if self.active().id() == id {
            return Some(SessionState::Active);
        }
        if self.iter().any(|s| s.id() == id) {
            Some(SessionState::Suspended)
        } else {
            Some(SessionState::Terminated)
        }
    }

    /// Sessions from the root to the top.
    pub fn iter(&self) -> impl Iterator<Item = &ShellSession> {
        std::iter::once(&self.root).chain(self.nested.iter())
    }

    /// Whether any live session has `shell_type`.
    pub fn contains(&self, shell_type: ShellType) -> bool {
        self.iter().any(|s| s.shell_type() == shell_type)
    }

    /// Prompt for the active session.
    pub fn prompt(&self, user: &str, host: &str) -> String {
        let active = self.active();
        match active.shell_type() {
            ShellType::Main => format!("[{}:{user}@{host}] {} $ ", self.depth(), active.cwd),
            other => format!("[{}:{user}@{host}] ({other}) > ", self.depth()),
        }
    }
}
