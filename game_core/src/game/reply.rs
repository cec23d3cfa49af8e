use std::fmt::{self, Display};

use getset::{CopyGetters, Getters};

use crate::grid::{self, FormatError, Reveal};
use crate::ledger::{LeaderboardTable, RankEntry};
use crate::render::RenderedImage;
use crate::round::Round;

/// A round together with the image players see of it.
#[derive(Clone, Debug, CopyGetters, Eq, Getters, PartialEq)]
pub struct RoundPicture {
    #[getset(get_copy = "pub")]
    round: Round,
    #[getset(get = "pub")]
    image: RenderedImage,
}

impl RoundPicture {
    pub fn new(round: Round, image: RenderedImage) -> Self {
        RoundPicture { round, image }
    }
}

/// What the game answers to a command.
///
/// Rejections such as guessing before a game started are replies, not errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reply {
    Started {
        picture: RoundPicture,
    },
    AlreadyStarted,
    NotStarted,
    /// The guess could not be read; shows how to guess instead.
    Prompt {
        grid_size: u32,
        problem: Option<FormatError>,
    },
    Wrong,
    Correct {
        points: u64,
        session_score: u64,
        picture: RoundPicture,
    },
    TimedOut {
        limit_seconds: u64,
        reveal: Option<Reveal>,
    },
    Stopped {
        reveal: Option<Reveal>,
    },
    Leaderboard(Vec<RankEntry>),
    Help {
        prefix: String,
    },
}

impl Reply {
    pub fn picture(&self) -> Option<&RoundPicture> {
        match self {
            Reply::Started { picture } | Reply::Correct { picture, .. } => Some(picture),
            _ => None,
        }
    }

    /// True for replies that changed nothing.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Reply::AlreadyStarted | Reply::NotStarted | Reply::Prompt { .. } | Reply::Wrong
        )
    }
}

const GUESS_HINT: &str = "Send a block number, or its row and column separated by a space.";

impl Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Started { picture } => {
                let n = picture.round().grid_size();
                write!(
                    f,
                    "Game on! One of these {} blocks is a slightly different color. Which one?\n{GUESS_HINT}",
                    grid::block_count(n)
                )
            },
            Reply::AlreadyStarted => f.write_str("A game is already running in this channel."),
            Reply::NotStarted => f.write_str("No game is running here. Start one first!"),
            Reply::Prompt { grid_size, problem } => {
                if let Some(problem) = problem {
                    writeln!(f, "Couldn't read that guess: {problem}.")?;
                }
                write!(
                    f,
                    "Guess a block from 1 to {}, or a row and column from 1 to {grid_size} like \"2 3\".",
                    grid::block_count(*grid_size)
                )
            },
            Reply::Wrong => f.write_str("Nope, that block matches the rest. Look closer!"),
            Reply::Correct {
                points,
                session_score,
                picture,
            } => write!(
                f,
                "Correct! +{points} points ({session_score} this game).\nLevel {} coming up, keep going!",
                picture.round().level()
            ),
            Reply::TimedOut {
                limit_seconds,
                reveal,
            } => {
                write!(f, "Over {limit_seconds} seconds passed! Game over.")?;
                write_reveal(f, reveal)
            },
            Reply::Stopped { reveal } => {
                write!(f, "Too hard? The game is over.")?;
                write_reveal(f, reveal)
            },
            Reply::Leaderboard(entries) => write!(f, "{}", LeaderboardTable(entries)),
            Reply::Help { prefix } => write!(
                f,
                "See Color: find the block with the odd color.\n\
                 {prefix} start        start a game in this channel\n\
                 {prefix} guess <sel>  guess a block number or \"row col\"\n\
                 {prefix} stop         give up and see the answer\n\
                 {prefix} leaderboard  best players\n\
                 {prefix} help         this message"
            ),
        }
    }
}

fn write_reveal(f: &mut fmt::Formatter<'_>, reveal: &Option<Reveal>) -> fmt::Result {
    match reveal {
        Some(reveal) => write!(f, "\nThe answer was {reveal}."),
        None => Ok(()),
    }
}
