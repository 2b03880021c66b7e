// src/events/event.rs

use std::fmt;

use serde_json::Value;

use crate::errors::ProcessFault;

/// Payload-free discriminant of a [`LifecycleEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Data,
    Close,
    Disconnect,
    Error,
    Exit,
    Message,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Data,
        EventKind::Close,
        EventKind::Disconnect,
        EventKind::Error,
        EventKind::Exit,
        EventKind::Message,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Data => "data",
            EventKind::Close => "close",
            EventKind::Disconnect => "disconnect",
            EventKind::Error => "error",
            EventKind::Exit => "exit",
            EventKind::Message => "message",
        }
    }

    /// `Close` and `Exit` complete the bus they are published on.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Close | EventKind::Exit)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observable occurrence in a worker process's life.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// A chunk of the worker's stdout (spawn mode), or its whole buffered
    /// stdout (exec mode).
    Data(Vec<u8>),
    /// The worker's stdio was torn down without a regular exit status.
    Close { code: Option<i32> },
    /// The worker closed its end of the message channel.
    Disconnect,
    /// The OS layer reported a fault.
    Error(ProcessFault),
    /// The worker terminated. `None` means it was killed by a signal.
    Exit { code: Option<i32> },
    /// A message received over the fork-mode channel.
    Message(Value),
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::Data(_) => EventKind::Data,
            LifecycleEvent::Close { .. } => EventKind::Close,
            LifecycleEvent::Disconnect => EventKind::Disconnect,
            LifecycleEvent::Error(_) => EventKind::Error,
            LifecycleEvent::Exit { .. } => EventKind::Exit,
            LifecycleEvent::Message(_) => EventKind::Message,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    /// Exit code carried by `Exit` / `Close`.
    pub fn code(&self) -> Option<i32> {
        match self {
            LifecycleEvent::Exit { code } | LifecycleEvent::Close { code } => *code,
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::Data(bytes) => write!(f, "data ({} bytes)", bytes.len()),
            LifecycleEvent::Close { code: Some(c) } => write!(f, "close (code {c})"),
            LifecycleEvent::Close { code: None } => f.write_str("close (no code)"),
            LifecycleEvent::Disconnect => f.write_str("disconnect"),
            LifecycleEvent::Error(fault) => write!(f, "error ({fault})"),
            LifecycleEvent::Exit { code: Some(c) } => write!(f, "exit (code {c})"),
            LifecycleEvent::Exit { code: None } => f.write_str("exit (signal)"),
            LifecycleEvent::Message(value) => write!(f, "message {value}"),
        }
    }
}
