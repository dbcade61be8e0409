use std::time::{Duration, Instant};

/// One line of the event log panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Client-side line, e.g. turn-advance `event_messages` or sync notices.
    System(String),
    /// Server event from the snapshot.
    Event {
        turn: i64,
        kind: String,
        text: String,
    },
}

impl Message {
    pub fn prefix(&self) -> String {
        match self {
            Message::System(_) => "[System]".to_string(),
            Message::Event { turn, .. } => format!("[Turn {turn}]"),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Message::System(t) => t,
            Message::Event { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Progress,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub expires_at: Instant,
}

/// Transient message overlay. A new notice replaces the current one.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    current: Option<Notice>,
}

impl NoticeBoard {
    pub fn show(&mut self, kind: NoticeKind, text: impl Into<String>, lifetime: Duration, now: Instant) {
        self.current = Some(Notice {
            kind,
            text: text.into(),
            expires_at: now + lifetime,
        });
    }

    pub fn active(&self, now: Instant) -> Option<&Notice> {
        self.current.as_ref().filter(|n| n.expires_at > now)
    }

    /// Drops the notice only if it is still a progress placeholder.
    pub fn clear_progress(&mut self) {
        if matches!(&self.current, Some(n) if n.kind == NoticeKind::Progress) {
            self.current = None;
        }
    }
}
