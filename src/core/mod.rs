// Match bookkeeping that does not touch the wire: clocks and ponder predictions.

use chess::Color;

pub mod clock;
pub mod ponder;

pub fn side_name(side: Color) -> &'static str {
    match side {
        Color::White => "white",
        Color::Black => "black",
    }
}
