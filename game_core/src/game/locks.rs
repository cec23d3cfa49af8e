use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One mutex per channel, created on first use.
///
/// A panic while a channel is held leaves nothing half-written in memory (all
/// state lives in the store), so poisoned locks are simply taken over.
///
/// Entries are never dropped: one small mutex per channel ever seen, the same
/// set of channels that keep a row in the store.
#[derive(Debug, Default)]
pub(crate) struct ChannelLocks {
    channels: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChannelLocks {
    fn lock_for(&self, channel_id: &str) -> Arc<Mutex<()>> {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        channels.entry(channel_id.to_string()).or_default().clone()
    }

    /// Runs `op` while holding the channel's lock.
    pub(crate) fn with_channel<T>(&self, channel_id: &str, op: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(channel_id);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        op()
    }
}
