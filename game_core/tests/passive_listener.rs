use game_core::prelude::*;
use test_log::test;

fn game(tweak: impl FnOnce(&mut GameConfiguration)) -> SeeColor<MemoryStore, RasterRenderer> {
    let config = GameConfiguration::default().with(|c| {
        c.set_block_size(6).set_spacing(2);
        tweak(c);
    });
    SeeColor::new(config, MemoryStore::new(), RasterRenderer)
        .unwrap()
        .with_random_source(ScriptedSource::new([ScriptedSource::picking(2, 4)]))
}

fn carol() -> Invocation {
    Invocation::new("lobby", "carol", "Carol", 0)
}

#[test]
fn commands_are_dispatched_and_stop_there() {
    let game = game(|_| {});
    let outcome = game.handle_message(&carol(), "see-color start").unwrap();
    assert!(matches!(outcome.reply, Some(Reply::Started { .. })));
    assert!(!outcome.propagate);

    let outcome = game.handle_message(&carol(), "see-color guess").unwrap();
    assert_eq!(
        outcome.reply,
        Some(Reply::Prompt {
            grid_size: 2,
            problem: None
        })
    );

    let outcome = game.handle_message(&carol(), "see-color.guess 3").unwrap();
    assert!(matches!(outcome.reply, Some(Reply::Correct { points: 2, .. })));
}

#[test]
fn bare_numbers_guess_while_a_game_runs() {
    let game = game(|_| {});
    // Nothing running yet: the message is not ours
    let outcome = game.handle_message(&carol(), "3").unwrap();
    assert_eq!(outcome.reply, None);
    assert!(outcome.propagate);

    game.handle_message(&carol(), "see-color start").unwrap();
    let outcome = game.handle_message(&carol(), "1").unwrap();
    assert_eq!(outcome.reply, Some(Reply::Wrong));
    assert!(!outcome.propagate);

    let outcome = game.handle_message(&carol(), "2 1").unwrap();
    assert!(matches!(outcome.reply, Some(Reply::Correct { .. })));
}

#[test]
fn chatter_passes_through() {
    let game = game(|_| {});
    game.handle_message(&carol(), "see-color start").unwrap();
    for text in ["hello", "5", "1 2 3", "3 3"] {
        let outcome = game.handle_message(&carol(), text).unwrap();
        assert_eq!(outcome.reply, None, "{text}");
        assert!(outcome.propagate, "{text}");
    }
    assert_eq!(game.session("lobby").unwrap().level(), 2);
}

#[test]
fn passive_guesses_can_propagate() {
    let game = game(|c| {
        c.set_interrupt_on_trigger(false);
    });
    game.handle_message(&carol(), "see-color start").unwrap();
    let outcome = game.handle_message(&carol(), "3").unwrap();
    assert!(matches!(outcome.reply, Some(Reply::Correct { .. })));
    assert!(outcome.propagate);
}

#[test]
fn passive_guessing_can_be_turned_off() {
    let game = game(|c| {
        c.set_passive_guess_enabled(false);
    });
    game.handle_message(&carol(), "see-color start").unwrap();
    let outcome = game.handle_message(&carol(), "3").unwrap();
    assert_eq!(outcome.reply, None);
    assert!(outcome.propagate);
    assert_eq!(game.session("lobby").unwrap().level(), 2);
}

#[test]
fn custom_prefix() {
    let game = game(|c| {
        c.set_command_prefix("!color".to_string());
    });
    assert_eq!(game.handle_message(&carol(), "see-color start").unwrap().reply, None);
    let outcome = game.handle_message(&carol(), "!color leaderboard").unwrap();
    assert_eq!(outcome.reply, Some(Reply::Leaderboard(Vec::new())));
}
