//! The in-memory room store.
//!
//! Two levels of locking: a `std::sync::Mutex` over the id index, held
//! only long enough to look up or insert an `Arc`, and one async mutex
//! per room serializing every read-modify-write on that room. The index
//! guard is never held across an `.await`.
//!
//! The sweep removes a slot from the index under the index lock, but a
//! caller may already hold a clone of that slot's `Arc` from a lookup
//! it did before the sweep ran. Committing into such an unlinked slot
//! would silently drop the update, so every room-lock acquisition goes
//! through [`RoomRepository::lock_live`], which re-checks after locking
//! that the index still maps the id to this exact slot and retries the
//! lookup if not.
//!
//! Mutations are clone-apply-commit: the closure runs against a clone
//! of the room and the clone replaces the original only on `Ok`, so a
//! rejected operation cannot leave a half-applied room behind even if
//! the closure mutated before failing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};

use twolies_core::{ChatMessage, GameError, Room, RoomId};

use crate::config::StoreConfig;
use crate::error::StoreError;

/// One room plus its per-room state: the chat log and the idle clock.
#[derive(Debug)]
struct RoomSlot {
    room: Room,
    chat: Vec<ChatMessage>,
    last_access: Instant,
}

impl RoomSlot {
    fn new(room: Room) -> Self {
        Self {
            room,
            chat: Vec::new(),
            last_access: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_access = Instant::now();
    }
}

/// Owns every live room. Cheap to share behind an [`Arc`].
#[derive(Debug)]
pub struct RoomRepository {
    slots: Mutex<HashMap<RoomId, Arc<AsyncMutex<RoomSlot>>>>,
    config: StoreConfig,
}

impl RoomRepository {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Looks up a room's slot without creating it.
    fn slot(&self, room_id: &RoomId) -> Option<Arc<AsyncMutex<RoomSlot>>> {
        self.index().get(room_id).cloned()
    }

    /// Looks up a room's slot, creating an empty room under this id if
    /// none exists. Concurrent callers with the same id all land on the
    /// same slot.
    fn slot_or_create(&self, room_id: &RoomId) -> Arc<AsyncMutex<RoomSlot>> {
        let mut index = self.index();
        if !index.contains_key(room_id) {
            info!(room_id = %room_id, "creating room");
        }
        index
            .entry(room_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(RoomSlot::new(Room::new(room_id.clone())))))
            .clone()
    }

    /// Locks the room's slot, guaranteeing that the locked slot is the
    /// one the index currently points at.
    ///
    /// The sweep can unlink a slot between our lookup and our lock
    /// acquisition; when that happens the lookup is retried, so a
    /// caller either locks a live slot or observes the room as gone.
    /// Returns `None` once the id has no slot at all.
    async fn lock_live(&self, room_id: &RoomId) -> Option<OwnedMutexGuard<RoomSlot>> {
        loop {
            let slot = self.slot(room_id)?;
            let guard = Arc::clone(&slot).lock_owned().await;
            if self.slot_is_current(room_id, &slot) {
                return Some(guard);
            }
        }
    }

    /// Like [`RoomRepository::lock_live`], but creates the room when
    /// the id has no slot.
    async fn lock_live_or_create(&self, room_id: &RoomId) -> OwnedMutexGuard<RoomSlot> {
        loop {
            let slot = self.slot_or_create(room_id);
            let guard = Arc::clone(&slot).lock_owned().await;
            if self.slot_is_current(room_id, &slot) {
                return guard;
            }
        }
    }

    fn slot_is_current(&self, room_id: &RoomId, slot: &Arc<AsyncMutex<RoomSlot>>) -> bool {
        self.index()
            .get(room_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// A snapshot of the room. Refreshes the idle clock.
    pub async fn get(&self, room_id: &RoomId) -> Result<Room, StoreError> {
        let mut guard = self
            .lock_live(room_id)
            .await
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;
        guard.touch();
        Ok(guard.room.clone())
    }

    /// Applies a mutation to an existing room under its lock.
    ///
    /// On `Ok` the closure's result is returned with a snapshot of the
    /// committed room; on `Err` the stored room is untouched.
    pub async fn mutate<T, F>(&self, room_id: &RoomId, f: F) -> Result<(T, Room), StoreError>
    where
        F: FnOnce(&mut Room) -> Result<T, GameError>,
    {
        let guard = self
            .lock_live(room_id)
            .await
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;
        Self::commit(guard, f)
    }

    /// Like [`RoomRepository::mutate`], but creates the room first if it
    /// does not exist. Used by join, where the first join brings the
    /// room into being.
    pub async fn mutate_or_create<T, F>(
        &self,
        room_id: &RoomId,
        f: F,
    ) -> Result<(T, Room), StoreError>
    where
        F: FnOnce(&mut Room) -> Result<T, GameError>,
    {
        let guard = self.lock_live_or_create(room_id).await;
        Self::commit(guard, f)
    }

    fn commit<T, F>(mut guard: OwnedMutexGuard<RoomSlot>, f: F) -> Result<(T, Room), StoreError>
    where
        F: FnOnce(&mut Room) -> Result<T, GameError>,
    {
        guard.touch();
        let mut draft = guard.room.clone();
        let value = f(&mut draft)?;
        guard.room = draft;
        Ok((value, guard.room.clone()))
    }

    /// Appends a message to the room's chat log.
    pub async fn append_chat(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<(), StoreError> {
        let mut guard = self
            .lock_live(room_id)
            .await
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;
        guard.touch();
        guard.chat.push(message);
        Ok(())
    }

    /// The room's full chat log, oldest first.
    pub async fn chat_history(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, StoreError> {
        let mut guard = self
            .lock_live(room_id)
            .await
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;
        guard.touch();
        Ok(guard.chat.clone())
    }

    pub fn len(&self) -> usize {
        self.index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index().is_empty()
    }

    /// Evicts rooms idle longer than the configured timeout. Rooms
    /// whose lock is currently held are skipped; the next sweep gets
    /// them. Returns the evicted ids.
    pub fn sweep(&self) -> Vec<RoomId> {
        let mut index = self.index();
        let mut evicted = Vec::new();
        index.retain(|room_id, slot| match slot.try_lock() {
            Ok(guard) => {
                if guard.last_access.elapsed() >= self.config.idle_timeout {
                    evicted.push(room_id.clone());
                    false
                } else {
                    true
                }
            }
            // In use right now, so by definition not idle.
            Err(_) => true,
        });
        drop(index);
        for room_id in &evicted {
            info!(room_id = %room_id, "evicted idle room");
        }
        evicted
    }

    /// Spawns the background task that sweeps on the configured
    /// interval. The task holds a weak reference, so dropping the last
    /// repository handle stops it.
    pub fn spawn_reaper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let repo = Arc::downgrade(self);
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(repo) = repo.upgrade() else { break };
                let evicted = repo.sweep();
                debug!(evicted = evicted.len(), live = repo.len(), "sweep complete");
            }
        })
    }

    fn index(&self) -> std::sync::MutexGuard<'_, HashMap<RoomId, Arc<AsyncMutex<RoomSlot>>>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            // A panic under the index lock leaves only trivial state
            // behind (the map of Arcs), so keep serving.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for RoomRepository {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
