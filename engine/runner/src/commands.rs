//! Stdin command parsing
//!
//! One command per line. Most map straight onto a [`SurfaceEvent`]; the rest
//! are runner controls.

use spiral_core::{BadgeId, ChallengeKind, InteractionKind, SurfaceEvent};
use thiserror::Error;

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Forward to the session
    Event(SurfaceEvent),
    /// Print the current view
    Status,
    /// Print the command list
    Help,
    /// End the session and exit
    Quit,
}

/// Why a line was not understood
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// First word is not a command
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    /// Command needs an argument
    #[error("`{command}` needs {expected}")]
    MissingArgument {
        /// Command name
        command: &'static str,
        /// What was expected
        expected: &'static str,
    },

    /// Argument did not parse
    #[error("`{command}` cannot use `{value}`")]
    InvalidArgument {
        /// Command name
        command: &'static str,
        /// The rejected value
        value: String,
    },
}

/// Help text for the `help` command
pub const HELP: &str = "\
commands:
  click | error | restart      record an interaction
  suspicion | chaos            raise suspicion / chaos by one
  choice                       force a choice (+10 frustration)
  complete <challenge>         report a completed challenge
  fail <challenge>             report a failed challenge
  depth <n>                    set spiral depth
  frustration <x>              set frustration score
  badge <id>                   grant a badge
  say <text>                   push a narrator line
  mirror                       resolve the mirror sequence
  status                       print the current view
  quit                         end the session
challenges: form, modal_spam, fake_leaderboard, moral_choice, menu_maze, progress_bar";

/// Parse one input line
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let event = match word.to_lowercase().as_str() {
        "" => return Err(CommandError::Empty),
        "help" | "?" => return Ok(Command::Help),
        "status" => return Ok(Command::Status),
        "quit" | "exit" => return Ok(Command::Quit),
        "click" | "error" | "restart" => SurfaceEvent::Interaction {
            kind: InteractionKind::parse(word),
        },
        "suspicion" => SurfaceEvent::SuspicionRaised,
        "chaos" => SurfaceEvent::ChaosRaised,
        "choice" => SurfaceEvent::ForcedChoice,
        "mirror" => SurfaceEvent::MirrorResolved,
        "complete" => SurfaceEvent::ChallengeCompleted {
            challenge: challenge_arg("complete", rest)?,
        },
        "fail" => SurfaceEvent::ChallengeFailed {
            challenge: challenge_arg("fail", rest)?,
        },
        "depth" => SurfaceEvent::SetSpiralDepth {
            depth: required("depth", rest, "a depth")?
                .parse()
                .map_err(|_| invalid("depth", rest))?,
        },
        "frustration" => SurfaceEvent::SetFrustration {
            score: required("frustration", rest, "a score")?
                .parse()
                .map_err(|_| invalid("frustration", rest))?,
        },
        "badge" => SurfaceEvent::GrantBadge {
            badge: BadgeId::parse(required("badge", rest, "a badge id")?)
                .ok_or_else(|| invalid("badge", rest))?,
        },
        "say" => SurfaceEvent::NarratorMessage {
            text: required("say", rest, "some text")?.to_string(),
        },
        _ => return Err(CommandError::Unknown(word.to_string())),
    };
    Ok(Command::Event(event))
}

fn required<'a>(
    command: &'static str,
    rest: &'a str,
    expected: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, expected })
    } else {
        Ok(rest)
    }
}

fn invalid(command: &'static str, value: &str) -> CommandError {
    CommandError::InvalidArgument {
        command,
        value: value.to_string(),
    }
}

fn challenge_arg(command: &'static str, rest: &str) -> Result<ChallengeKind, CommandError> {
    ChallengeKind::parse(required(command, rest, "a challenge")?).ok_or_else(|| invalid(command, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_interactions() {
        assert_eq!(
            parse("click"),
            Ok(Command::Event(SurfaceEvent::Interaction {
                kind: InteractionKind::Click
            }))
        );
        assert_eq!(
            parse("  ERROR "),
            Ok(Command::Event(SurfaceEvent::Interaction {
                kind: InteractionKind::Error
            }))
        );
    }

    #[test]
    fn test_arguments() {
        assert_eq!(
            parse("complete modal-spam"),
            Ok(Command::Event(SurfaceEvent::ChallengeCompleted {
                challenge: ChallengeKind::ModalSpam
            }))
        );
        assert_eq!(
            parse("say  Hello there,  visitor"),
            Ok(Command::Event(SurfaceEvent::NarratorMessage {
                text: "Hello there,  visitor".to_string()
            }))
        );
        assert_eq!(
            parse("depth 4"),
            Ok(Command::Event(SurfaceEvent::SetSpiralDepth { depth: 4 }))
        );
        assert_eq!(
            parse("badge loop-survivor"),
            Ok(Command::Event(SurfaceEvent::GrantBadge {
                badge: BadgeId::LoopSurvivor
            }))
        );
    }

    #[test]
    fn test_controls() {
        assert_eq!(parse("quit"), Ok(Command::Quit));
        assert_eq!(parse("status"), Ok(Command::Status));
        assert_eq!(parse("?"), Ok(Command::Help));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert_eq!(parse("dance"), Err(CommandError::Unknown("dance".to_string())));
        assert_eq!(
            parse("fail"),
            Err(CommandError::MissingArgument {
                command: "fail",
                expected: "a challenge"
            })
        );
        assert_eq!(
            parse("depth deep"),
            Err(CommandError::InvalidArgument {
                command: "depth",
                value: "deep".to_string()
            })
        );
        assert!(matches!(
            parse("complete captcha"),
            Err(CommandError::InvalidArgument { .. })
        ));
    }
}
