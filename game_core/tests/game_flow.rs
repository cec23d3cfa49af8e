use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use game_core::prelude::*;
use test_log::test;

fn small_config() -> GameConfiguration {
    GameConfiguration::default().with(|c| {
        c.set_block_size(6).set_spacing(2);
    })
}

/// A game whose first target is the zero-based block `target` of a
/// `bound`-block grid. Later draws all come back as 0.5.
fn game_with_target(
    config: GameConfiguration,
    target: u32,
    bound: u32,
) -> SeeColor<MemoryStore, RasterRenderer> {
    SeeColor::new(config, MemoryStore::new(), RasterRenderer)
        .unwrap()
        .with_random_source(ScriptedSource::new([ScriptedSource::picking(target, bound)]))
}

fn alice(timestamp: u64) -> Invocation {
    Invocation::new("channel", "alice", "Alice", timestamp)
}

#[test]
fn correct_guess_scores_the_level_and_advances() {
    let game = game_with_target(small_config(), 2, 4);
    let reply = game.start(&alice(0)).unwrap();
    assert_eq!(reply.picture().unwrap().round().target(), 2);

    assert_eq!(game.guess(&alice(1_000), "4").unwrap(), Reply::Wrong);
    let session = game.session("channel").unwrap();
    assert_eq!(session.level(), 2);
    assert_eq!(session.block(), Some(3));

    let reply = game.guess(&alice(2_000), "3").unwrap();
    let Reply::Correct {
        points,
        session_score,
        picture,
    } = reply
    else {
        panic!("expected a correct guess, got {reply:?}");
    };
    assert_eq!(points, 2);
    assert_eq!(session_score, 2);
    assert_eq!(picture.round().level(), 3);
    assert_eq!(picture.round().grid_size(), 3);

    let session = game.session("channel").unwrap();
    assert_eq!(session.level(), 3);
    assert_eq!(session.block(), Some(picture.round().target() + 1));
    assert_eq!(session.timestamp(), Some(2_000));
    assert_eq!(game.ledger().session_score("channel", "alice").unwrap(), Some(2));
    assert_eq!(
        game.leaderboard().unwrap(),
        Reply::Leaderboard(vec![RankEntry::new("alice", "Alice", 2)])
    );
}

#[test]
fn session_score_is_a_running_sum() {
    let game = game_with_target(small_config(), 0, 4);
    game.start(&alice(0)).unwrap();
    game.guess(&alice(1), "1").unwrap();
    // Every later target is drawn from 0.5: the middle block of a 3x3 grid
    let reply = game.guess(&alice(2), "2 2").unwrap();
    assert!(matches!(reply, Reply::Correct { points: 3, session_score: 5, .. }));
    assert_eq!(
        game.ledger().top_n(10).unwrap(),
        vec![RankEntry::new("alice", "Alice", 5)]
    );
}

#[test]
fn row_col_guess_must_match_the_target_cell() {
    let config = small_config().with(|c| {
        c.set_initial_level(3);
    });
    let game = game_with_target(config, 8, 9);
    game.start(&alice(0)).unwrap();

    let reply = game.guess(&alice(1), "9 9").unwrap();
    assert!(matches!(
        reply,
        Reply::Prompt {
            grid_size: 3,
            problem: Some(FormatError::CellOutOfRange { row: 9, col: 9, size: 3 })
        }
    ));
    assert_eq!(game.guess(&alice(2), "3 2").unwrap(), Reply::Wrong);
    assert!(matches!(
        game.guess(&alice(3), "3 3").unwrap(),
        Reply::Correct { points: 3, .. }
    ));
}

#[test]
fn starting_twice_changes_nothing() {
    let game = game_with_target(small_config(), 1, 4);
    game.start(&alice(0)).unwrap();
    let before = game.session("channel").unwrap();

    assert_eq!(game.start(&alice(5)).unwrap(), Reply::AlreadyStarted);
    assert_eq!(game.session("channel").unwrap(), before);
}

#[test]
fn unreadable_guesses_are_prompted_even_without_a_game() {
    let game = game_with_target(small_config(), 0, 4);
    assert!(matches!(
        game.guess(&alice(0), "9 9").unwrap(),
        Reply::Prompt { .. }
    ));
    assert!(matches!(
        game.guess(&alice(0), "five").unwrap(),
        Reply::Prompt { .. }
    ));
    assert_eq!(game.guess(&alice(0), "1").unwrap(), Reply::NotStarted);
}

#[test]
fn slow_guess_times_out_and_stops_the_game() {
    let config = small_config().with(|c| {
        c.set_guess_time_limit_seconds(10);
    });
    let game = game_with_target(config, 2, 4);
    game.start(&alice(0)).unwrap();

    // Exactly at the limit still counts
    assert_eq!(game.guess(&alice(10_000), "1").unwrap(), Reply::Wrong);

    let reply = game.guess(&alice(11_000), "3").unwrap();
    assert_eq!(
        reply,
        Reply::TimedOut {
            limit_seconds: 10,
            reveal: Some(Reveal { block: 3, row: 2, col: 1 }),
        }
    );
    assert!(!game.session("channel").unwrap().is_started());
    assert_eq!(game.guess(&alice(12_000), "3").unwrap(), Reply::NotStarted);
}

#[test]
fn stop_reveals_and_clears_session_scores() {
    let game = game_with_target(small_config(), 0, 4);
    game.start(&alice(0)).unwrap();
    game.guess(&alice(1), "1").unwrap();
    assert_eq!(game.ledger().session_score("channel", "alice").unwrap(), Some(2));

    let reply = game.stop(&alice(2)).unwrap();
    assert_eq!(
        reply,
        Reply::Stopped {
            reveal: Some(Reveal { block: 5, row: 2, col: 2 }),
        }
    );
    assert_eq!(game.ledger().session_score("channel", "alice").unwrap(), None);
    assert_eq!(game.stop(&alice(3)).unwrap(), Reply::NotStarted);

    // The best score outlives the session
    assert_eq!(game.ledger().top_n(1).unwrap(), vec![RankEntry::new("alice", "Alice", 2)]);
}

#[test]
fn restarting_resets_the_level() {
    let game = game_with_target(small_config(), 0, 4);
    game.start(&alice(0)).unwrap();
    game.guess(&alice(1), "1").unwrap();
    game.stop(&alice(2)).unwrap();

    let reply = game.start(&alice(3)).unwrap();
    assert_eq!(reply.picture().unwrap().round().level(), 2);
    assert_eq!(game.session("channel").unwrap().level(), 2);
}

#[test]
fn channels_play_independently() {
    let game = game_with_target(small_config(), 0, 4);
    let bob = Invocation::new("elsewhere", "bob", "Bob", 0);
    game.start(&alice(0)).unwrap();
    assert_eq!(game.guess(&bob, "1").unwrap(), Reply::NotStarted);
    assert_eq!(game.stop(&bob).unwrap(), Reply::NotStarted);
    assert!(game.session("channel").unwrap().is_started());
}

#[test]
fn jpeg_when_compression_is_on() {
    let config = small_config().with(|c| {
        c.set_compress_images(true).set_image_quality(50);
    });
    let game = game_with_target(config, 0, 4);
    let reply = game.start(&alice(0)).unwrap();
    let image = reply.picture().unwrap().image();
    assert_eq!(image.format, PictureFormat::Jpeg { quality: 50 });
    assert_eq!(&image.bytes[..2], &[0xff, 0xd8]);
}

#[derive(Debug, Default)]
struct FlakyRenderer {
    broken: AtomicBool,
}

impl Renderer for FlakyRenderer {
    fn render(&self, request: &game_core::render::RenderRequest) -> Result<Vec<u8>, RenderError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("browser went away").into());
        }
        RasterRenderer.render(request)
    }
}

#[test]
fn render_failure_leaves_the_game_untouched() {
    let game = SeeColor::new(small_config(), MemoryStore::new(), FlakyRenderer::default())
        .unwrap()
        .with_random_source(ScriptedSource::new([ScriptedSource::picking(2, 4)]));

    game.start(&alice(0)).unwrap();
    let before = game.session("channel").unwrap();

    game.renderer().broken.store(true, Ordering::SeqCst);
    assert!(matches!(
        game.guess(&alice(1), "3"),
        Err(GameError::Render(_))
    ));
    assert_eq!(game.session("channel").unwrap(), before);
    assert_eq!(game.ledger().session_score("channel", "alice").unwrap(), None);
    assert!(game.ledger().top_n(10).unwrap().is_empty());
}

#[test]
fn render_failure_on_start_keeps_the_game_stopped() {
    let renderer = FlakyRenderer::default();
    renderer.broken.store(true, Ordering::SeqCst);
    let game = SeeColor::new(small_config(), MemoryStore::new(), renderer).unwrap();
    assert!(matches!(game.start(&alice(0)), Err(GameError::Render(_))));
    assert!(!game.session("channel").unwrap().is_started());
}

#[test]
fn simultaneous_correct_guesses_are_credited_once() {
    let game = game_with_target(small_config(), 2, 4);
    game.start(&alice(0)).unwrap();

    let replies: Vec<Reply> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let game = &game;
                scope.spawn(move || {
                    let player = Invocation::new("channel", &format!("p{i}"), &format!("P{i}"), 1);
                    game.guess(&player, "3").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let correct = replies
        .iter()
        .filter(|r| matches!(r, Reply::Correct { .. }))
        .count();
    assert_eq!(correct, 1, "{replies:?}");
    assert_eq!(replies.iter().filter(|r| **r == Reply::Wrong).count(), 7);
    assert_eq!(game.session("channel").unwrap().level(), 3);
    assert_eq!(game.ledger().top_n(10).unwrap().len(), 1);
}

#[test]
fn games_survive_a_restart_with_the_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    {
        let game = SeeColor::new(small_config(), JsonFileStore::open(&path).unwrap(), RasterRenderer)
            .unwrap()
            .with_random_source(ScriptedSource::new([ScriptedSource::picking(1, 4)]));
        game.start(&alice(0)).unwrap();
    }

    let game = SeeColor::new(small_config(), JsonFileStore::open(&path).unwrap(), RasterRenderer)
        .unwrap()
        .with_random_source(RngSource::seeded(7));
    let session = game.session("channel").unwrap();
    assert!(session.is_started());
    assert_eq!(session.block(), Some(2));
    assert!(matches!(
        game.guess(&alice(1), "1 2").unwrap(),
        Reply::Correct { points: 2, .. }
    ));
}

#[test]
fn huge_time_limits_do_not_overflow() {
    let config = small_config().with(|c| {
        c.set_guess_time_limit_seconds(u64::MAX / 100);
    });
    let game = game_with_target(config, 2, 4);
    game.start(&alice(0)).unwrap();
    assert_eq!(game.guess(&alice(u64::MAX), "1").unwrap(), Reply::Wrong);
    assert!(matches!(
        game.guess(&alice(u64::MAX), "3").unwrap(),
        Reply::Correct { points: 2, .. }
    ));
}

/// Produces no bytes, so only the request's own checks can fail.
#[derive(Debug, Default)]
struct BlankRenderer;

impl Renderer for BlankRenderer {
    fn render(&self, _request: &game_core::render::RenderRequest) -> Result<Vec<u8>, RenderError> {
        Ok(Vec::new())
    }
}

#[test]
fn outgrowing_the_canvas_fails_without_advancing() {
    // 271 blocks of 50px still fit a 16384px canvas, 272 do not
    let config = GameConfiguration::default().with(|c| {
        c.set_initial_level(271);
    });
    let game = SeeColor::new(config, MemoryStore::new(), BlankRenderer)
        .unwrap()
        .with_random_source(ScriptedSource::new([ScriptedSource::picking(0, 271 * 271)]));
    game.start(&alice(0)).unwrap();
    let before = game.session("channel").unwrap();
    assert_eq!(before.block(), Some(1));

    assert!(matches!(
        game.guess(&alice(1), "1"),
        Err(GameError::Render(RenderError::TooLarge { grid_size: 272, .. }))
    ));
    assert_eq!(game.session("channel").unwrap(), before);
    assert!(game.ledger().top_n(10).unwrap().is_empty());
}

/// A memory store whose writes can be made to fail, per collection.
#[derive(Debug, Default)]
struct UnreliableStore {
    inner: MemoryStore,
    games_down: AtomicBool,
    scores_down: AtomicBool,
}

impl UnreliableStore {
    fn check(&self, collection: Collection) -> Result<(), StoreError> {
        let down = match collection {
            Collection::Games => &self.games_down,
            Collection::SessionScores | Collection::Leaderboard => &self.scores_down,
        };
        if down.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full").into());
        }
        Ok(())
    }
}

impl Store for UnreliableStore {
    fn get(&self, collection: Collection, filter: &Record) -> Result<Vec<Record>, StoreError> {
        self.inner.get(collection, filter)
    }

    fn create(&self, collection: Collection, fields: Record) -> Result<Record, StoreError> {
        self.check(collection)?;
        self.inner.create(collection, fields)
    }

    fn set(&self, collection: Collection, filter: &Record, fields: Record) -> Result<(), StoreError> {
        self.check(collection)?;
        self.inner.set(collection, filter, fields)
    }

    fn remove(&self, collection: Collection, filter: &Record) -> Result<(), StoreError> {
        self.check(collection)?;
        self.inner.remove(collection, filter)
    }
}

fn unreliable_game() -> SeeColor<UnreliableStore, RasterRenderer> {
    SeeColor::new(small_config(), UnreliableStore::default(), RasterRenderer)
        .unwrap()
        .with_random_source(ScriptedSource::new([ScriptedSource::picking(2, 4)]))
}

#[test]
fn failed_game_write_credits_nothing() {
    let game = unreliable_game();
    game.start(&alice(0)).unwrap();
    let before = game.session("channel").unwrap();

    game.store().games_down.store(true, Ordering::SeqCst);
    assert!(matches!(game.guess(&alice(1), "3"), Err(GameError::Storage(_))));
    assert_eq!(game.session("channel").unwrap(), before);
    assert_eq!(game.ledger().session_score("channel", "alice").unwrap(), None);
    assert!(game.ledger().top_n(10).unwrap().is_empty());

    // Once the store recovers the same block pays exactly once
    game.store().games_down.store(false, Ordering::SeqCst);
    assert!(matches!(
        game.guess(&alice(2), "3").unwrap(),
        Reply::Correct { points: 2, session_score: 2, .. }
    ));
    assert_eq!(game.ledger().session_score("channel", "alice").unwrap(), Some(2));
}

#[test]
fn failed_score_write_cannot_be_replayed() {
    let game = unreliable_game();
    game.start(&alice(0)).unwrap();

    game.store().scores_down.store(true, Ordering::SeqCst);
    assert!(matches!(game.guess(&alice(1), "3"), Err(GameError::Storage(_))));
    assert_eq!(game.session("channel").unwrap().level(), 3);

    game.store().scores_down.store(false, Ordering::SeqCst);
    // The next target is the middle of a 3x3 grid, so block 3 now misses
    assert_eq!(game.guess(&alice(2), "3").unwrap(), Reply::Wrong);
    assert_eq!(game.ledger().session_score("channel", "alice").unwrap(), None);
    assert!(game.ledger().top_n(10).unwrap().is_empty());
}
