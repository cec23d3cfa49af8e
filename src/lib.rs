//! Console front end for the see_color game.

pub mod console;
pub mod preview;
