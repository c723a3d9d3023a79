use crate::model::Profile;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

/// Until initialization has run, consumers must treat the identity as
/// unknown rather than absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Loading => "loading",
            SessionPhase::Ready => "ready",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn { profile_id: String },
    SignedOut,
}

/// Process-wide session state, owned by the application state and passed
/// explicitly. Changes are pushed to subscribers; a subscription is
/// cancelled by dropping it, and dead subscribers are pruned on the next
/// broadcast.
pub struct SessionStore {
    phase: SessionPhase,
    current: Option<Profile>,
    subscribers: Vec<Sender<SessionEvent>>,
}

pub struct SessionSubscription {
    rx: Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Drain every event delivered since the last call.
    pub fn pending(&self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(ev) => events.push(ev),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            phase: SessionPhase::Loading,
            current: None,
            subscribers: Vec::new(),
        }
    }

    /// Startup step: there is no persisted session with the embedded
    /// provider, so initialization just moves `loading -> ready` with no
    /// identity.
    pub fn initialize(&mut self) {
        self.phase = SessionPhase::Ready;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current(&self) -> Option<&Profile> {
        self.current.as_ref()
    }

    pub fn subscribe(&mut self) -> SessionSubscription {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        SessionSubscription { rx }
    }

    pub fn set_signed_in(&mut self, profile: Profile) {
        let event = SessionEvent::SignedIn {
            profile_id: profile.id.clone(),
        };
        self.current = Some(profile);
        self.phase = SessionPhase::Ready;
        self.broadcast(event);
    }

    pub fn clear(&mut self) {
        let had_session = self.current.take().is_some();
        self.phase = SessionPhase::Ready;
        if had_session {
            self.broadcast(SessionEvent::SignedOut);
        }
    }

    fn broadcast(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.into(),
            email: format!("{id}@example.com"),
            full_name: None,
            role: Role::Teacher,
            created_at: "2026-01-01T00:00:00.000000Z".into(),
        }
    }

    #[test]
    fn starts_loading_until_initialized() {
        let mut sessions = SessionStore::new();
        assert_eq!(sessions.phase(), SessionPhase::Loading);
        assert!(sessions.current().is_none());
        sessions.initialize();
        assert_eq!(sessions.phase(), SessionPhase::Ready);
    }

    #[test]
    fn subscribers_see_sign_in_and_sign_out() {
        let mut sessions = SessionStore::new();
        sessions.initialize();
        let sub = sessions.subscribe();

        sessions.set_signed_in(profile("t1"));
        sessions.clear();

        let events = sub.pending();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], SessionEvent::SignedIn { profile_id } if profile_id == "t1"));
        assert!(matches!(events[1], SessionEvent::SignedOut));
    }

    #[test]
    fn sign_out_without_session_emits_nothing() {
        let mut sessions = SessionStore::new();
        sessions.initialize();
        let sub = sessions.subscribe();
        sessions.clear();
        assert!(sub.pending().is_empty());
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let mut sessions = SessionStore::new();
        sessions.initialize();
        let sub = sessions.subscribe();
        drop(sub);
        sessions.set_signed_in(profile("t1"));
        // Pruned on broadcast; a later subscriber still works.
        let sub2 = sessions.subscribe();
        sessions.clear();
        assert_eq!(sub2.pending().len(), 1);
    }
}
