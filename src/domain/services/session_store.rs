#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::Weak;

use crate::domain::models::Message;
use crate::domain::models::SessionState;

pub type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct Inner {
    state: SessionState,
    observers: Vec<(u64, Observer)>,
    next_observer_id: u64,
}

/// Sole owner of the conversation state. Every mutation notifies each
/// registered observer exactly once, in registration order, with the state as
/// it is right after that mutation.
///
/// Observers run while the store holds its dispatch lock, so they may read
/// `snapshot()` but must not call any mutating operation.
pub struct SessionStore {
    inner: Mutex<Inner>,
    dispatch: Mutex<()>,
}

/// Handle returned by `SessionStore::subscribe`. Dropping it keeps the
/// observer registered, call `unsubscribe` to remove it.
pub struct Subscription {
    store: Weak<SessionStore>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            store
                .lock_inner()
                .observers
                .retain(|(id, _)| return *id != self.id);
        }
    }
}

/// Mutations applied through `SessionStore::update`. All of them become visible
/// to observers together.
pub struct SessionUpdate<'a> {
    state: &'a mut SessionState,
    dirty: bool,
}

impl<'a> SessionUpdate<'a> {
    pub fn input(&self) -> &str {
        return &self.state.input;
    }

    pub fn is_pending(&self) -> bool {
        return self.state.is_pending;
    }

    pub fn set_input(&mut self, text: &str) {
        self.state.input = text.to_string();
        self.dirty = true;
    }

    pub fn append_message(&mut self, msg: Message) {
        self.state.messages.push(msg);
        self.dirty = true;
    }

    pub fn set_pending(&mut self, flag: bool) {
        self.state.is_pending = flag;
        self.dirty = true;
    }
}

impl SessionStore {
    pub fn new() -> Arc<SessionStore> {
        return Arc::new(SessionStore {
            inner: Mutex::new(Inner {
                state: SessionState::default(),
                observers: vec![],
                next_observer_id: 0,
            }),
            dispatch: Mutex::new(()),
        });
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        return self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    }

    pub fn snapshot(&self) -> SessionState {
        return self.lock_inner().state.clone();
    }

    pub fn subscribe<F>(self: &Arc<Self>, observer: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let mut inner = self.lock_inner();
        let id = inner.next_observer_id;
        inner.next_observer_id += 1;
        inner.observers.push((id, Arc::new(observer)));

        return Subscription {
            store: Arc::downgrade(self),
            id,
        };
    }

    pub fn set_input(&self, text: &str) {
        self.update(|tx| tx.set_input(text));
    }

    pub fn append_message(&self, msg: Message) {
        self.update(|tx| tx.append_message(msg));
    }

    pub fn set_pending(&self, flag: bool) {
        self.update(|tx| tx.set_pending(flag));
    }

    /// Runs `f` against the state and notifies observers once afterwards, if
    /// `f` mutated anything.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionUpdate) -> R,
    {
        let _dispatch = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);

        let (res, notify) = {
            let mut inner = self.lock_inner();
            let mut tx = SessionUpdate {
                state: &mut inner.state,
                dirty: false,
            };
            let res = f(&mut tx);
            let dirty = tx.dirty;

            let mut notify = None;
            if dirty {
                let observers = inner
                    .observers
                    .iter()
                    .map(|(_, observer)| return observer.clone())
                    .collect::<Vec<Observer>>();
                notify = Some((inner.state.clone(), observers));
            }

            (res, notify)
        };

        if let Some((state, observers)) = notify {
            for observer in observers {
                observer(&state);
            }
        }

        return res;
    }
}
