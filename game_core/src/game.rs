//! The per-channel game: starting, guessing, stopping.
//!
//! [SeeColor] keeps nothing about a channel in memory. Every command loads
//! the channel's [GameSession] from the store, decides, and writes it back
//! while holding that channel's lock. A new target is only written once its
//! image rendered, so a stored target always matches the last image sent.

mod locks;
mod reply;

use std::fmt;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

pub use reply::{Reply, RoundPicture};

use self::locks::ChannelLocks;
use crate::configuration::{ConfigError, GameConfiguration};
use crate::difficulty::DifficultyCurve;
use crate::grid::{Selector, MAX_GRID_SIZE};
use crate::ledger::ScoreLedger;
use crate::random::{RandomSource, RngSource};
use crate::render::{
    GridPicture, PictureFormat, RenderError, RenderRequest, RenderedImage, Renderer,
};
use crate::round::Round;
use crate::session::GameSession;
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error("rendering failure: {0}")]
    Render(#[from] RenderError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type GameResult<T> = Result<T, GameError>;

/// Who sent a command, where, and when (milliseconds since the epoch).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub channel_id: String,
    pub user_id: String,
    pub username: String,
    pub timestamp: u64,
}

impl Invocation {
    pub fn new(channel_id: &str, user_id: &str, username: &str, timestamp: u64) -> Self {
        Invocation {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            timestamp,
        }
    }

}

pub struct SeeColor<S, R> {
    config: GameConfiguration,
    curve: DifficultyCurve,
    format: PictureFormat,
    store: S,
    renderer: R,
    rng: Mutex<Box<dyn RandomSource>>,
    locks: ChannelLocks,
}

impl<S: fmt::Debug, R: fmt::Debug> fmt::Debug for SeeColor<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeeColor")
            .field("config", &self.config)
            .field("curve", &self.curve)
            .field("store", &self.store)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

impl<S: Store, R: Renderer> SeeColor<S, R> {
    pub fn new(config: GameConfiguration, store: S, renderer: R) -> GameResult<Self> {
        config.validate()?;
        Ok(SeeColor {
            curve: DifficultyCurve::from_config(&config),
            format: PictureFormat::from_config(&config),
            config,
            store,
            renderer,
            rng: Mutex::new(Box::new(RngSource::from_entropy())),
            locks: ChannelLocks::default(),
        })
    }

    /// Replaces the random source, for seeded or scripted games.
    pub fn with_random_source<G: RandomSource + 'static>(mut self, rng: G) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn config(&self) -> &GameConfiguration {
        &self.config
    }

    pub fn curve(&self) -> &DifficultyCurve {
        &self.curve
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn ledger(&self) -> ScoreLedger<&S> {
        ScoreLedger::new(&self.store)
    }

    /// The channel's stored state, created at the initial level if new.
    pub fn session(&self, channel_id: &str) -> GameResult<GameSession> {
        Ok(GameSession::load_or_create(
            &self.store,
            channel_id,
            self.config.initial_level(),
        )?)
    }

    fn next_round(&self, level: u32) -> Round {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Round::generate(level, &self.curve, self.config.color_diff_mode(), &mut **rng)
    }

    fn render(&self, round: Round) -> Result<RoundPicture, RenderError> {
        let picture = GridPicture::from_config(round, &self.config);
        let request = RenderRequest::new(picture, self.format)?;
        let bytes = self.renderer.render(&request)?;
        Ok(RoundPicture::new(
            round,
            RenderedImage {
                bytes,
                format: self.format,
            },
        ))
    }

    fn grid_size_of(&self, session: &GameSession) -> u32 {
        session
            .current_grid_size(|level| self.curve.grid_size(level))
            .min(MAX_GRID_SIZE)
    }

    pub fn start(&self, invocation: &Invocation) -> GameResult<Reply> {
        let channel_id = invocation.channel_id.as_str();
        self.locks.with_channel(channel_id, || -> GameResult<Reply> {
            let session = self.session(channel_id)?;
            if session.is_started() {
                log::debug!("Channel [{channel_id}] asked to start a running game");
                return Ok(Reply::AlreadyStarted);
            }
            let round = self.next_round(self.config.initial_level());
            let picture = self.render(round)?;
            self.ledger().clear_session(channel_id)?;
            session.showing(&round, invocation.timestamp).save(&self.store)?;
            log::info!(
                "[{}] started a game in [{channel_id}] at level {}",
                invocation.user_id,
                round.level()
            );
            Ok(Reply::Started { picture })
        })
    }

    /// Checks `raw` against the channel's current grid.
    ///
    /// Unreadable guesses are answered with a prompt before anything else is
    /// looked at, even when no game is running.
    pub fn guess(&self, invocation: &Invocation, raw: &str) -> GameResult<Reply> {
        let channel_id = invocation.channel_id.as_str();
        self.locks.with_channel(channel_id, || -> GameResult<Reply> {
            let session = self.session(channel_id)?;
            let grid_size = self.grid_size_of(&session);
            let selector = match Selector::parse(raw, grid_size) {
                Ok(selector) => selector,
                Err(problem) => {
                    log::debug!("Unreadable guess [{raw}] in [{channel_id}]: {problem}");
                    return Ok(Reply::Prompt {
                        grid_size,
                        problem: Some(problem),
                    });
                },
            };
            let target = match session.block() {
                Some(block) if session.is_started() && block >= 1 => block - 1,
                _ => return Ok(Reply::NotStarted),
            };

            let limit_seconds = self.config.guess_time_limit_seconds();
            if session.has_expired(limit_seconds, invocation.timestamp) {
                log::info!("Game in [{channel_id}] ran out of time at level {}", session.level());
                self.ledger().clear_session(channel_id)?;
                session.stopped().save(&self.store)?;
                return Ok(Reply::TimedOut {
                    limit_seconds,
                    reveal: session.reveal(grid_size),
                });
            }

            if !selector.hits(grid_size, target) {
                return Ok(Reply::Wrong);
            }

            let points = u64::from(session.level());
            let round = self.next_round(session.level().saturating_add(1));
            let picture = self.render(round)?;

            // Target moves before points land: a failed score write loses
            // this guess's points instead of paying them twice.
            session.showing(&round, invocation.timestamp).save(&self.store)?;
            let ledger = self.ledger();
            let session_score = ledger.add_to_session_score(
                channel_id,
                &invocation.user_id,
                &invocation.username,
                points,
            )?;
            ledger.upsert_best(&invocation.user_id, &invocation.username, session_score)?;
            log::info!(
                "[{}] found the block in [{channel_id}], level {} -> {}",
                invocation.user_id,
                session.level(),
                round.level()
            );
            Ok(Reply::Correct {
                points,
                session_score,
                picture,
            })
        })
    }

    /// Shown when `guess` is sent without a selector.
    pub fn guess_prompt(&self, invocation: &Invocation) -> GameResult<Reply> {
        let session = self.session(&invocation.channel_id)?;
        Ok(Reply::Prompt {
            grid_size: self.grid_size_of(&session),
            problem: None,
        })
    }

    pub fn stop(&self, invocation: &Invocation) -> GameResult<Reply> {
        let channel_id = invocation.channel_id.as_str();
        self.locks.with_channel(channel_id, || -> GameResult<Reply> {
            let session = self.session(channel_id)?;
            if !session.is_started() {
                return Ok(Reply::NotStarted);
            }
            self.ledger().clear_session(channel_id)?;
            session.stopped().save(&self.store)?;
            log::info!(
                "[{}] stopped the game in [{channel_id}] at level {}",
                invocation.user_id,
                session.level()
            );
            Ok(Reply::Stopped {
                reveal: session.reveal(self.grid_size_of(&session)),
            })
        })
    }

    pub fn leaderboard(&self) -> GameResult<Reply> {
        let entries = self.ledger().top_n(self.config.leaderboard_size())?;
        Ok(Reply::Leaderboard(entries))
    }

    pub fn help(&self) -> Reply {
        Reply::Help {
            prefix: self.config.command_prefix().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::random::ScriptedSource;
    use crate::render::RasterRenderer;
    use crate::store::MemoryStore;

    fn game() -> SeeColor<MemoryStore, RasterRenderer> {
        let config = GameConfiguration::default().with(|c| {
            c.set_block_size(8).set_spacing(2);
        });
        SeeColor::new(config, MemoryStore::new(), RasterRenderer)
            .unwrap()
            .with_random_source(ScriptedSource::new([ScriptedSource::picking(0, 4)]))
    }

    #[test]
    fn start_shows_a_picture_of_the_stored_target() {
        let game = game();
        let alice = Invocation::new("c1", "u1", "Alice", 0);
        let reply = game.start(&alice).unwrap();
        let picture = reply.picture().unwrap();
        assert_eq!(picture.round().grid_size(), 2);
        assert_eq!(picture.image().format, PictureFormat::Png);

        let session = game.session("c1").unwrap();
        assert!(session.is_started());
        assert_eq!(session.block(), Some(picture.round().target() + 1));
    }

    #[test]
    fn stop_before_start_is_rejected() {
        let game = game();
        let reply = game.stop(&Invocation::new("c1", "u1", "Alice", 0)).unwrap();
        assert_eq!(reply, Reply::NotStarted);
    }

    #[test]
    fn invalid_configuration_is_refused() {
        let config = GameConfiguration::default().with(|c| {
            c.set_image_quality(0);
        });
        assert!(matches!(
            SeeColor::new(config, MemoryStore::new(), RasterRenderer),
            Err(GameError::Config(_))
        ));
    }

    #[test]
    fn empty_guess_gets_the_prompt() {
        let game = game();
        let alice = Invocation::new("c1", "u1", "Alice", 0);
        assert_eq!(
            game.guess_prompt(&alice).unwrap(),
            Reply::Prompt {
                grid_size: 2,
                problem: None
            }
        );
    }
}
