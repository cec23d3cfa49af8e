//! Scores: per-channel session totals and the global leaderboard.

use std::fmt::{self, Display};

use getset::{CopyGetters, Getters};

use crate::common::{Record, RecordErr};
use crate::store::{Collection, RecordErrUtils, Store, StoreResult};

mod key {
    use typed_key::{typed_key, Key};

    pub const CHANNEL_ID: Key<String> = typed_key!("channelId");
    pub const USER_ID: Key<String> = typed_key!("userId");
    pub const USERNAME: Key<String> = typed_key!("username");
    pub const SCORE: Key<u64> = typed_key!("score");
    pub const BEST_SCORE: Key<u64> = typed_key!("bestScore");
}

/// A player's points in the game currently running in one channel.
#[derive(Clone, Debug, CopyGetters, Eq, Getters, PartialEq)]
pub struct PlayingRecord {
    #[getset(get = "pub")]
    channel_id: String,
    #[getset(get = "pub")]
    user_id: String,
    #[getset(get = "pub")]
    username: String,
    #[getset(get_copy = "pub")]
    score: u64,
}

impl PlayingRecord {
    fn from_record(record: &Record) -> StoreResult<Self> {
        let collection = Collection::SessionScores;
        Ok(PlayingRecord {
            channel_id: record.get_required(key::CHANNEL_ID).in_collection(collection)?,
            user_id: record.get_required(key::USER_ID).in_collection(collection)?,
            username: record.get_or_default(key::USERNAME).in_collection(collection)?,
            score: record.get_or_default(key::SCORE).in_collection(collection)?,
        })
    }
}

/// A player's best session total across every channel.
#[derive(Clone, Debug, CopyGetters, Eq, Getters, PartialEq)]
pub struct RankEntry {
    #[getset(get = "pub")]
    user_id: String,
    #[getset(get = "pub")]
    username: String,
    #[getset(get_copy = "pub")]
    best_score: u64,
}

impl RankEntry {
    pub fn new(user_id: &str, username: &str, best_score: u64) -> Self {
        RankEntry {
            user_id: user_id.to_string(),
            username: username.to_string(),
            best_score,
        }
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        let collection = Collection::Leaderboard;
        Ok(RankEntry {
            user_id: record.get_required(key::USER_ID).in_collection(collection)?,
            username: record.get_or_default(key::USERNAME).in_collection(collection)?,
            best_score: record.get_or_default(key::BEST_SCORE).in_collection(collection)?,
        })
    }
}

/// Plain-text ranking, one line per entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeaderboardTable<'a>(pub &'a [RankEntry]);

impl Display for LeaderboardTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "See Color leaderboard:")?;
        writeln!(f, " Rank  Name   Score")?;
        write!(f, "--------------------")?;
        if self.0.is_empty() {
            write!(f, "\n  (nobody has scored yet)")?;
        }
        for (i, entry) in self.0.iter().enumerate() {
            write!(
                f,
                "\n {:>2}   {:<6} {}",
                i + 1,
                entry.username,
                entry.best_score
            )?;
        }
        Ok(())
    }
}

fn filter(fields: Result<Record, RecordErr>, collection: Collection) -> StoreResult<Record> {
    fields.in_collection(collection)
}

/// Score bookkeeping on top of a [Store].
#[derive(Debug)]
pub struct ScoreLedger<S> {
    store: S,
}

impl<S: Store> ScoreLedger<S> {
    pub fn new(store: S) -> Self {
        ScoreLedger { store }
    }

    fn session_filter(channel_id: &str, user_id: &str) -> StoreResult<Record> {
        filter(
            Record::new()
                .with(key::CHANNEL_ID, channel_id.to_string())
                .and_then(|r| r.with(key::USER_ID, user_id.to_string())),
            Collection::SessionScores,
        )
    }

    fn playing_record(&self, channel_id: &str, user_id: &str) -> StoreResult<Option<PlayingRecord>> {
        self.store
            .get(Collection::SessionScores, &Self::session_filter(channel_id, user_id)?)?
            .first()
            .map(PlayingRecord::from_record)
            .transpose()
    }

    /// Adds `delta` to the player's total for the channel's running game,
    /// creating it on the player's first point, and returns the new total.
    pub fn add_to_session_score(
        &self,
        channel_id: &str,
        user_id: &str,
        username: &str,
        delta: u64,
    ) -> StoreResult<u64> {
        let collection = Collection::SessionScores;
        match self.playing_record(channel_id, user_id)? {
            None => {
                let fields = filter(
                    Self::session_filter(channel_id, user_id)?
                        .with(key::USERNAME, username.to_string())
                        .and_then(|r| r.with(key::SCORE, delta)),
                    collection,
                )?;
                self.store.create(collection, fields)?;
                Ok(delta)
            },
            Some(record) => {
                let total = record.score.saturating_add(delta);
                let fields = filter(
                    Record::new()
                        .with(key::USERNAME, username.to_string())
                        .and_then(|r| r.with(key::SCORE, total)),
                    collection,
                )?;
                self.store
                    .set(collection, &Self::session_filter(channel_id, user_id)?, fields)?;
                Ok(total)
            },
        }
    }

    pub fn session_score(&self, channel_id: &str, user_id: &str) -> StoreResult<Option<u64>> {
        Ok(self
            .playing_record(channel_id, user_id)?
            .map(|record| record.score))
    }

    /// Every player's running total in the channel, in the order they first scored.
    pub fn session_scores(&self, channel_id: &str) -> StoreResult<Vec<PlayingRecord>> {
        let by_channel = filter(
            Record::new().with(key::CHANNEL_ID, channel_id.to_string()),
            Collection::SessionScores,
        )?;
        self.store
            .get(Collection::SessionScores, &by_channel)?
            .iter()
            .map(PlayingRecord::from_record)
            .collect()
    }

    pub fn clear_session(&self, channel_id: &str) -> StoreResult<()> {
        let by_channel = filter(
            Record::new().with(key::CHANNEL_ID, channel_id.to_string()),
            Collection::SessionScores,
        )?;
        self.store.remove(Collection::SessionScores, &by_channel)
    }

    /// Records `candidate` as the player's best if it beats the stored one.
    /// The stored name is refreshed together with the score. Returns the best
    /// score after the update.
    pub fn upsert_best(&self, user_id: &str, username: &str, candidate: u64) -> StoreResult<u64> {
        let collection = Collection::Leaderboard;
        let by_user = filter(Record::new().with(key::USER_ID, user_id.to_string()), collection)?;
        let current = self
            .store
            .get(collection, &by_user)?
            .first()
            .map(RankEntry::from_record)
            .transpose()?;
        match current {
            None => {
                let fields = filter(
                    by_user
                        .clone()
                        .with(key::USERNAME, username.to_string())
                        .and_then(|r| r.with(key::BEST_SCORE, candidate)),
                    collection,
                )?;
                self.store.create(collection, fields)?;
                log::debug!("[{user_id}] enters the leaderboard with {candidate}");
                Ok(candidate)
            },
            Some(entry) if candidate > entry.best_score => {
                let fields = filter(
                    Record::new()
                        .with(key::USERNAME, username.to_string())
                        .and_then(|r| r.with(key::BEST_SCORE, candidate)),
                    collection,
                )?;
                self.store.set(collection, &by_user, fields)?;
                log::debug!("[{user_id}] best score {} -> {candidate}", entry.best_score);
                Ok(candidate)
            },
            Some(entry) => Ok(entry.best_score),
        }
    }

    /// The `n` best players, highest first. Ties keep the order players
    /// first entered the board.
    pub fn top_n(&self, n: usize) -> StoreResult<Vec<RankEntry>> {
        let mut entries = self
            .store
            .get(Collection::Leaderboard, &Record::new())?
            .iter()
            .map(RankEntry::from_record)
            .collect::<StoreResult<Vec<_>>>()?;
        entries.sort_by(|a, b| b.best_score.cmp(&a.best_score));
        entries.truncate(n);
        Ok(entries)
    }
}
