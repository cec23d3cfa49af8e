use std::io::Write;

use crossterm::queue;
use crossterm::style::{self, Print, ResetColor, SetBackgroundColor};
use game_core::color::Color;
use game_core::round::Round;

const CELL: &str = "    ";

fn terminal_color(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Paints the round into a truecolor terminal, two text rows per block,
/// with one-based column numbers on top and row numbers on the left.
pub fn draw_round<W: Write>(out: &mut W, round: &Round) -> anyhow::Result<()> {
    let n = round.grid_size();
    queue!(out, Print("    "))?;
    for col in 1..=n {
        queue!(out, Print(format!("{col:^4} ")))?;
    }
    queue!(out, Print("\n"))?;
    for row in 0..n {
        for line in 0..2 {
            let label = if line == 0 {
                format!("{:>3} ", row + 1)
            } else {
                "    ".to_string()
            };
            queue!(out, Print(label))?;
            for col in 0..n {
                let color = round.color_of(game_core::grid::row_col_to_block(n, row, col));
                queue!(
                    out,
                    SetBackgroundColor(terminal_color(color)),
                    Print(CELL),
                    ResetColor,
                    Print(" ")
                )?;
            }
            queue!(out, Print("\n"))?;
        }
    }
    out.flush()?;
    Ok(())
}
