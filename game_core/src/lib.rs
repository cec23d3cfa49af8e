//! Core of the "spot the odd color" chat game.
//!
//! [game::SeeColor] is the entry point. It is generic over where records are
//! kept ([store::Store]) and how grids become images ([render::Renderer]).

pub mod color;
pub mod command;
pub mod common;
pub mod configuration;
pub mod difficulty;
pub mod game;
pub mod grid;
pub mod ledger;
pub mod prelude;
pub mod random;
pub mod render;
pub mod round;
pub mod session;
pub mod store;
