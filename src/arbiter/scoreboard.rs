// Plain terminal rendering of the match state, printed before every turn.

use chess::Color;

use crate::core::clock::MatchClock;
use crate::rules::PositionSummary;

const TERM_WIDTH: usize = 75;

pub fn print_turn(
    title: &str,
    white_name: &str,
    black_name: &str,
    clock: &MatchClock,
    side: Color,
    summary: &PositionSummary,
) {
    println!("{}", render_turn(title, white_name, black_name, clock, side, summary));
}

pub fn render_turn(
    title: &str,
    white_name: &str,
    black_name: &str,
    clock: &MatchClock,
    side: Color,
    summary: &PositionSummary,
) -> String {
    let mut lines = Vec::new();

    lines.push(title.to_string());
    lines.push(format!("{white_name} vs {black_name}"));
    lines.push(format!(
        "White Clock: {:.1}  Black Clock: {:.1}",
        clock.remaining(Color::White),
        clock.remaining(Color::Black),
    ));
    lines.push(match side {
        Color::White => "White to move.".to_string(),
        Color::Black => "Black to move.".to_string(),
    });
    lines.push("-".repeat(TERM_WIDTH));
    lines.push(format!("{} moves in game.", summary.fullmove_number));
    lines.push(format!("{} half moves since last capture or pawn move.", summary.halfmove_clock));
    lines.push(format!("{} legal moves available to play.", summary.legal_moves));
    lines.push(String::new());
    lines.push(summary.diagram.clone());
    lines.push(format!("Captures: {} : {}", summary.captures[0], summary.captures[1]));

    if summary.in_check {
        let banner = "CHECK!";
        let padding = (TERM_WIDTH - banner.len()) / 2;
        lines.push(format!("{}{banner}{}", "-".repeat(padding), "-".repeat(TERM_WIDTH - banner.len() - padding)));
    }

    lines.join("\n")
}
