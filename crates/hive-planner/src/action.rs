//! Turn output commands.
//!
//! Actions render to the wire format (`BEACON 3 2`, `LINE 0 5 1`, `WAIT`,
//! `MESSAGE text`) and parse back through [`FromStr`], so a command line coming
//! from a judge log is decoded into a typed variant or a [`ParseActionError`].

use std::{fmt, num::ParseIntError, str::FromStr};

use hive_board::CellIndex;
use serde::{Deserialize, Serialize};

/// A single command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Beacon {
        cell: CellIndex,
        strength: u32,
    },
    Line {
        from: CellIndex,
        to: CellIndex,
        strength: u32,
    },
    Wait,
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseActionError {
    #[display("empty action")]
    Empty,
    #[display("unknown action `{verb}`")]
    UnknownVerb { verb: String },
    #[display("`{verb}` takes {expected} arguments, got {actual}")]
    ArgumentCount {
        verb: &'static str,
        expected: usize,
        actual: usize,
    },
    #[display("invalid argument `{arg}` to `{verb}`")]
    InvalidArgument {
        verb: &'static str,
        arg: String,
        source: ParseIntError,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beacon { cell, strength } => write!(f, "BEACON {cell} {strength}"),
            Self::Line { from, to, strength } => write!(f, "LINE {from} {to} {strength}"),
            Self::Wait => f.write_str("WAIT"),
            Self::Message(text) => write!(f, "MESSAGE {text}"),
        }
    }
}

fn parse_args<const N: usize>(
    verb: &'static str,
    args: &[&str],
) -> Result<[usize; N], ParseActionError> {
    if args.len() != N {
        return Err(ParseActionError::ArgumentCount {
            verb,
            expected: N,
            actual: args.len(),
        });
    }
    let mut values = [0; N];
    for (value, arg) in values.iter_mut().zip(args) {
        *value = arg
            .parse()
            .map_err(|source| ParseActionError::InvalidArgument {
                verb,
                arg: (*arg).to_owned(),
                source,
            })?;
    }
    Ok(values)
}

fn strength(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let args = rest.split_whitespace().collect::<Vec<_>>();
        match verb.to_ascii_uppercase().as_str() {
            "" => Err(ParseActionError::Empty),
            "BEACON" => {
                let [cell, raw] = parse_args("BEACON", &args)?;
                Ok(Self::Beacon {
                    cell,
                    strength: strength(raw),
                })
            }
            "LINE" => {
                let [from, to, raw] = parse_args("LINE", &args)?;
                Ok(Self::Line {
                    from,
                    to,
                    strength: strength(raw),
                })
            }
            "WAIT" => {
                let [] = parse_args::<0>("WAIT", &args)?;
                Ok(Self::Wait)
            }
            "MESSAGE" => Ok(Self::Message(rest.trim().to_owned())),
            _ => Err(ParseActionError::UnknownVerb {
                verb: verb.to_owned(),
            }),
        }
    }
}

/// The full output of one turn.
///
/// Renders as the `;`-joined actions, or `WAIT` when there are none so every
/// turn still produces a valid command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionList(Vec<Action>);

impl ActionList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.0.push(action);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Action] {
        &self.0
    }
}

impl FromIterator<Action> for ActionList {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ActionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "{}", Action::Wait);
        }
        for (i, action) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{action}")?;
        }
        Ok(())
    }
}

impl FromStr for ActionList {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(';')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}
