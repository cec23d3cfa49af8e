use getset::{CopyGetters, Getters};

use crate::common::{Record, RecordErr};
use crate::grid::Reveal;
use crate::round::Round;
use crate::store::{Collection, RecordErrUtils, Store, StoreResult};

pub(crate) mod key {
    use typed_key::{typed_key, Key};

    pub const CHANNEL_ID: Key<String> = typed_key!("channelId");
    pub const IS_STARTED: Key<bool> = typed_key!("isStarted");
    pub const LEVEL: Key<u32> = typed_key!("level");
    pub const BLOCK: Key<Option<u32>> = typed_key!("block");
    pub const GRID_SIZE: Key<Option<u32>> = typed_key!("gridSize");
    pub const TIMESTAMP: Key<Option<u64>> = typed_key!("timestamp");
}

/// Stored state of one channel's game.
///
/// One row per channel in [Collection::Games], created the first time the
/// channel is seen and never deleted.
#[derive(Clone, Debug, CopyGetters, Eq, Getters, PartialEq)]
pub struct GameSession {
    #[getset(get = "pub")]
    channel_id: String,
    #[getset(get_copy = "pub")]
    is_started: bool,
    #[getset(get_copy = "pub")]
    level: u32,
    /// One-based index of the odd block in the grid currently shown.
    #[getset(get_copy = "pub")]
    block: Option<u32>,
    /// Side of the grid currently shown.
    #[getset(get_copy = "pub")]
    grid_size: Option<u32>,
    /// Milliseconds since the epoch of the last start or correct guess.
    #[getset(get_copy = "pub")]
    timestamp: Option<u64>,
}

impl GameSession {
    pub fn new(channel_id: &str, level: u32) -> Self {
        GameSession {
            channel_id: channel_id.to_string(),
            is_started: false,
            level,
            block: None,
            grid_size: None,
            timestamp: None,
        }
    }

    pub fn filter(channel_id: &str) -> StoreResult<Record> {
        Record::new()
            .with(key::CHANNEL_ID, channel_id.to_string())
            .in_collection(Collection::Games)
    }

    pub fn from_record(record: &Record) -> StoreResult<Self> {
        let collection = Collection::Games;
        Ok(GameSession {
            channel_id: record.get_required(key::CHANNEL_ID).in_collection(collection)?,
            is_started: record.get_or_default(key::IS_STARTED).in_collection(collection)?,
            level: record.get_required(key::LEVEL).in_collection(collection)?,
            block: record.get_or_default(key::BLOCK).in_collection(collection)?,
            grid_size: record.get_or_default(key::GRID_SIZE).in_collection(collection)?,
            timestamp: record.get_or_default(key::TIMESTAMP).in_collection(collection)?,
        })
    }

    pub fn to_record(&self) -> StoreResult<Record> {
        self.fields().in_collection(Collection::Games)
    }

    fn fields(&self) -> Result<Record, RecordErr> {
        Record::new()
            .with(key::CHANNEL_ID, &self.channel_id)?
            .with(key::IS_STARTED, self.is_started)?
            .with(key::LEVEL, self.level)?
            .with(key::BLOCK, self.block)?
            .with(key::GRID_SIZE, self.grid_size)?
            .with(key::TIMESTAMP, self.timestamp)
    }

    pub fn load<S: Store + ?Sized>(store: &S, channel_id: &str) -> StoreResult<Option<Self>> {
        store
            .get(Collection::Games, &Self::filter(channel_id)?)?
            .first()
            .map(Self::from_record)
            .transpose()
    }

    /// Reads the channel's session, creating a fresh one at `initial_level`
    /// if the channel has never played.
    pub fn load_or_create<S: Store + ?Sized>(
        store: &S,
        channel_id: &str,
        initial_level: u32,
    ) -> StoreResult<Self> {
        if let Some(session) = Self::load(store, channel_id)? {
            return Ok(session);
        }
        log::debug!("First game in channel [{channel_id}]");
        let session = GameSession::new(channel_id, initial_level);
        store.create(Collection::Games, session.to_record()?)?;
        Ok(session)
    }

    pub fn save<S: Store + ?Sized>(&self, store: &S) -> StoreResult<()> {
        store.set(
            Collection::Games,
            &Self::filter(&self.channel_id)?,
            self.to_record()?,
        )
    }

    /// The session after `round` went up on screen at `now`.
    pub fn showing(&self, round: &Round, now: u64) -> Self {
        GameSession {
            channel_id: self.channel_id.clone(),
            is_started: true,
            level: round.level(),
            block: Some(round.target() + 1),
            grid_size: Some(round.grid_size()),
            timestamp: Some(now),
        }
    }

    pub fn stopped(&self) -> Self {
        GameSession {
            is_started: false,
            ..self.clone()
        }
    }

    /// Side of the grid on screen; sessions saved without one fall back to
    /// `fallback`.
    pub fn current_grid_size(&self, fallback: impl FnOnce(u32) -> u32) -> u32 {
        self.grid_size.unwrap_or_else(|| fallback(self.level))
    }

    /// Where the odd block of the current grid is, if there is one.
    pub fn reveal(&self, grid_size: u32) -> Option<Reveal> {
        self.block
            .filter(|&block| block >= 1)
            .map(|block| Reveal::of(grid_size.max(1), block - 1))
    }

    /// Whether more than `limit_seconds` passed since the last timestamp.
    /// A limit of zero never expires.
    pub fn has_expired(&self, limit_seconds: u64, now: u64) -> bool {
        match self.timestamp {
            Some(last) if limit_seconds > 0 => {
                now.saturating_sub(last) > limit_seconds.saturating_mul(1000)
            },
            _ => false,
        }
    }
}
