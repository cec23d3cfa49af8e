//! Chat messages in, replies out.
//!
//! Commands look like `<prefix> <name> [argument]`, with either a space or a
//! dot after the prefix (`see-color start`, `see-color.guess 2 3`). Messages
//! that are not commands may still be guesses; see [SeeColor::handle_message].

use crate::game::{GameResult, Invocation, Reply, SeeColor};
use crate::grid::Selector;
use crate::render::Renderer;
use crate::session::GameSession;
use crate::store::Store;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Start,
    /// `None` when sent without a selector.
    Guess(Option<String>),
    Stop,
    Leaderboard,
    Help,
}

impl Command {
    /// Reads `line` as a command addressed with `prefix`.
    ///
    /// Returns `None` for lines not addressed to the game. Unknown or missing
    /// command names read as [Command::Help].
    pub fn parse(line: &str, prefix: &str) -> Option<Command> {
        let rest = line.trim().strip_prefix(prefix)?;
        let rest = match rest.chars().next() {
            None => return Some(Command::Help),
            Some('.') => &rest[1..],
            Some(c) if c.is_whitespace() => rest,
            Some(_) => return None,
        };
        let rest = rest.trim_start();
        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };
        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "guess" => Command::Guess(Some(argument.to_string()).filter(|a| !a.is_empty())),
            "stop" => Command::Stop,
            "leaderboard" | "rank" => Command::Leaderboard,
            "" | "help" => Command::Help,
            unknown => {
                log::debug!("Unknown command [{unknown}], showing help");
                Command::Help
            },
        };
        Some(command)
    }
}

/// What became of one chat message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub reply: Option<Reply>,
    /// Whether later message handlers should still see the message.
    pub propagate: bool,
}

impl Outcome {
    fn ignored() -> Self {
        Outcome {
            reply: None,
            propagate: true,
        }
    }
}

impl<S: Store, R: Renderer> SeeColor<S, R> {
    pub fn execute(&self, invocation: &Invocation, command: &Command) -> GameResult<Reply> {
        log::debug!(
            "[{}] in [{}]: {command:?}",
            invocation.user_id,
            invocation.channel_id
        );
        match command {
            Command::Start => self.start(invocation),
            Command::Guess(Some(raw)) => self.guess(invocation, raw),
            Command::Guess(None) => self.guess_prompt(invocation),
            Command::Stop => self.stop(invocation),
            Command::Leaderboard => self.leaderboard(),
            Command::Help => Ok(self.help()),
        }
    }

    /// Runs a message through the command parser, then the passive listener.
    ///
    /// While a channel has a game running, a bare message that reads as a
    /// selector for the current grid counts as a guess when
    /// `passiveGuessEnabled` is set. Commands never propagate; a passive guess
    /// propagates unless `interruptOnTrigger` is set.
    pub fn handle_message(&self, invocation: &Invocation, text: &str) -> GameResult<Outcome> {
        if let Some(command) = Command::parse(text, self.config().command_prefix()) {
            return Ok(Outcome {
                reply: Some(self.execute(invocation, &command)?),
                propagate: false,
            });
        }
        if !self.config().passive_guess_enabled() {
            return Ok(Outcome::ignored());
        }
        let session = match GameSession::load(self.store(), &invocation.channel_id)? {
            Some(session) if session.is_started() => session,
            _ => return Ok(Outcome::ignored()),
        };
        let grid_size = session.current_grid_size(|level| self.curve().grid_size(level));
        if Selector::parse(text, grid_size).is_err() {
            return Ok(Outcome::ignored());
        }
        log::debug!("Passive guess [{}] in [{}]", text.trim(), invocation.channel_id);
        Ok(Outcome {
            reply: Some(self.guess(invocation, text)?),
            propagate: !self.config().interrupt_on_trigger(),
        })
    }
}
