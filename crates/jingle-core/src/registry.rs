//! Session Registry
//!
//! The registry is the only mutable state shared between the signaling
//! dispatcher (inbound events) and the session initiator (outbound calls).
//! It owns the existence of every live session: a SID maps to exactly one
//! call session from registration until termination.
//!
//! Lookups of unrelated SIDs never contend beyond a map shard. Transitions on
//! one SID are serialized through a per-session lock: [`SessionRegistry::lock`]
//! hands out a [`SessionGuard`] and every read-modify-write (lookup, mutate,
//! maybe evict) happens while it is held. A session terminated through a
//! guard is gone for good: a second TERMINATE racing the first finds nothing
//! to lock, and the SID is tombstoned so it can never be registered again.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{CallError, Result};
use crate::session::SharedCall;
use crate::types::{CallState, SessionId};

#[derive(Clone)]
struct SessionEntry {
    call: SharedCall,
    state: Arc<Mutex<CallState>>,
    created_at: DateTime<Utc>,
}

/// Snapshot of registry counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Sessions currently registered
    pub active: usize,
    /// Sessions registered since the registry was created
    pub total_created: usize,
    /// Sessions terminated since the registry was created
    ///
    /// A dial rolled back before its initiate went out is not counted here.
    pub total_terminated: usize,
}

/// Concurrency-safe map from SID to call session
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionEntry>,
    // SIDs of terminated sessions; they stay unusable for the registry's lifetime
    terminated: DashSet<SessionId>,
    total_created: AtomicUsize,
    total_terminated: AtomicUsize,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return it locked
    ///
    /// The guard is taken before the session becomes visible, so no other
    /// transition on this SID can run until the caller releases it. A SID
    /// that is live or was terminated is rejected with `DuplicateSession`.
    pub fn register(
        &self,
        sid: SessionId,
        call: SharedCall,
        state: CallState,
    ) -> Result<SessionGuard<'_>> {
        let entry = SessionEntry {
            call,
            state: Arc::new(Mutex::new(state)),
            created_at: Utc::now(),
        };
        let guard = entry
            .state
            .clone()
            .try_lock_owned()
            .map_err(|_| CallError::internal("fresh session lock is contended"))?;

        match self.sessions.entry(sid.clone()) {
            Entry::Occupied(_) => return Err(CallError::DuplicateSession { sid }),
            Entry::Vacant(_) if self.terminated.contains(&sid) => {
                return Err(CallError::DuplicateSession { sid });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry.clone());
            }
        }
        self.total_created.fetch_add(1, Ordering::Relaxed);
        debug!("Registered session {} in state {:?}", sid, state);

        Ok(SessionGuard {
            registry: self,
            sid,
            entry,
            state: guard,
        })
    }

    /// Register a session without holding on to its lock
    pub fn put(&self, sid: SessionId, call: SharedCall, state: CallState) -> Result<()> {
        self.register(sid, call, state).map(drop)
    }

    /// Look up the session registered under `sid`
    pub fn get(&self, sid: &SessionId) -> Option<SharedCall> {
        self.sessions.get(sid).map(|entry| entry.call.clone())
    }

    /// Lock the session registered under `sid` for a transition
    ///
    /// Returns `None` when the SID is unknown or was terminated while this
    /// caller waited for the lock.
    pub async fn lock(&self, sid: &SessionId) -> Option<SessionGuard<'_>> {
        // Clone out of the map so no shard lock is held across the await
        let entry = self.sessions.get(sid)?.value().clone();
        let state = entry.state.clone().lock_owned().await;
        if state.is_terminated() {
            return None;
        }
        Some(SessionGuard {
            registry: self,
            sid: sid.clone(),
            entry,
            state,
        })
    }

    /// Evict the session registered under `sid`, marking it terminated
    pub async fn remove(&self, sid: &SessionId) -> Option<SharedCall> {
        let guard = self.lock(sid).await?;
        Some(guard.terminate())
    }

    /// Current state of the session registered under `sid`
    pub async fn state(&self, sid: &SessionId) -> Option<CallState> {
        let entry = self.sessions.get(sid)?.value().clone();
        let state = *entry.state.lock().await;
        (!state.is_terminated()).then_some(state)
    }

    /// When the session under `sid` was registered
    pub fn created_at(&self, sid: &SessionId) -> Option<DateTime<Utc>> {
        self.sessions.get(sid).map(|entry| entry.created_at)
    }

    /// Whether a session was terminated under `sid`
    pub fn is_terminated(&self, sid: &SessionId) -> bool {
        self.terminated.contains(sid)
    }

    pub fn contains(&self, sid: &SessionId) -> bool {
        self.sessions.contains_key(sid)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// SIDs of all registered sessions, in no particular order
    pub fn sids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active: self.sessions.len(),
            total_created: self.total_created.load(Ordering::Relaxed),
            total_terminated: self.total_terminated.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sids())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Exclusive access to one registered session
///
/// Dropping the guard releases the session for the next transition.
pub struct SessionGuard<'a> {
    registry: &'a SessionRegistry,
    sid: SessionId,
    entry: SessionEntry,
    state: OwnedMutexGuard<CallState>,
}

impl<'a> SessionGuard<'a> {
    pub fn sid(&self) -> &SessionId {
        &self.sid
    }

    pub fn call(&self) -> &SharedCall {
        &self.entry.call
    }

    pub fn state(&self) -> CallState {
        *self.state
    }

    pub fn set_state(&mut self, state: CallState) {
        debug!("Session {} state: {:?} -> {:?}", self.sid, *self.state, state);
        *self.state = state;
    }

    /// Evict the session and mark it terminated; returns the evicted call
    ///
    /// The SID is tombstoned before the entry is removed, so a concurrent
    /// `register` sees either the live entry or the tombstone.
    pub fn terminate(mut self) -> SharedCall {
        self.registry.terminated.insert(self.sid.clone());
        self.evict();
        self.registry.total_terminated.fetch_add(1, Ordering::Relaxed);

        debug!("Session {} state: {:?} -> Terminated", self.sid, *self.state);
        *self.state = CallState::Terminated;
        self.entry.call.clone()
    }

    /// Undo a registration whose call never went live
    ///
    /// Unlike [`terminate`](Self::terminate) this leaves no tombstone and no
    /// trace in the stats.
    pub fn rollback(mut self) {
        if self.evict() {
            self.registry.total_created.fetch_sub(1, Ordering::Relaxed);
        }
        debug!("Session {} registration rolled back", self.sid);
        *self.state = CallState::Terminated;
    }

    fn evict(&self) -> bool {
        let lock = &self.entry.state;
        self.registry
            .sessions
            .remove_if(&self.sid, |_, current| Arc::ptr_eq(&current.state, lock))
            .is_some()
    }
}
