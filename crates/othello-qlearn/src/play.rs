use std::io::{BufRead, Write};

use othello::Color;

use crate::episode::PlayMode;
use crate::error::Result;
use crate::session::Session;

/// Plays one game on a text terminal: the human enters `row col` (0-based)
/// and the agent answers, learning as it goes. `quit`, `exit` or end of
/// input stop early; the table and statistics are flushed in either case.
pub fn play_game<R: BufRead, W: Write>(
    session: &mut Session,
    human: Color,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    session.set_mode(PlayMode::HumanVsAgent { agent: human.opponent() });
    writeln!(output, "You play {}. The agent plays {}.", human, human.opponent())?;

    loop {
        if session.terminated_now() {
            writeln!(output, "Game over!")?;
            write!(output, "{}", session.episode().game())?;
            let (black, white) = session.score_now();
            let verdict = match black.cmp(&white) {
                std::cmp::Ordering::Greater if human == Color::Black => "You win!",
                std::cmp::Ordering::Less if human == Color::White => "You win!",
                std::cmp::Ordering::Equal => "It's a draw.",
                _ => "The agent wins.",
            };
            writeln!(output, "Final score: ○ Black: {}, ● White: {}. {}", black, white, verdict)?;
            return Ok(());
        }

        let side = session.side_to_move();
        let legal = session.legal_moves_now();

        if legal.is_empty() {
            writeln!(output, "{} has no legal move and passes.", side)?;
            if let Err(refusal) = session.pass_now() {
                writeln!(output, "{}", refusal)?;
            }
            continue;
        }

        if session.mode().is_agent(side) {
            let step = session.agent_move()?;
            writeln!(output, "The agent ({}) plays {}.", side, step.action)?;
            continue;
        }

        write!(output, "{}", session.episode().game())?;
        write!(output, "Legal moves: ")?;
        for (r, c) in &legal {
            write!(output, "({} {}) ", r, c)?;
        }
        writeln!(output)?;
        writeln!(output, "Enter your next move (in form: row col), or 'quit' to exit.")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output, "Input closed, quitting game.")?;
            break;
        }
        let line = line.trim();

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            writeln!(output, "Quitting game.")?;
            break;
        }

        let mut parts = line.split_whitespace();
        let (Some(row), Some(col)) = (
            parts.next().and_then(|x| x.parse::<usize>().ok()),
            parts.next().and_then(|y| y.parse::<usize>().ok()),
        ) else {
            writeln!(output, "Could not read a move from {:?}. Try again.", line)?;
            continue;
        };

        match session.human_move(row, col) {
            Ok(step) => writeln!(output, "You flipped {} stone(s).", step.flipped.len())?,
            Err(refusal) => writeln!(output, "Refused: {} (code {}). Try again.", refusal, refusal.code())?,
        }
    }

    session.flush();
    Ok(())
}
