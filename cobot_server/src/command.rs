//! Text command parser.
//!
//! One inbound line becomes one [`Command`]. The line is uppercased and
//! split on whitespace; the first token selects a verb from a fixed table:
//!
//! | Verb | Command |
//! |------|---------|
//! | `;…` / blank | [`Command::NoOp`] |
//! | `M80` | [`Command::PowerOn`] |
//! | `M81` | [`Command::PowerOff`] |
//! | `G30` | [`Command::Home`] |
//! | `G1`  | [`Command::Move`] |
//!
//! `G1` arguments are parsed leniently: every token is classified on its
//! own as an axis override, a feed rate, or a skipped token. Skipped tokens
//! are logged and dropped; the command survives. An unknown verb aborts the
//! whole line.

use cobot_common::device::types::AxisLabel;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// First character of a comment line.
pub const COMMENT_MARKER: char = ';';

/// Prefix of the feed-rate word in `G1` arguments.
pub const FEED_MARKER: char = 'F';

/// Number of fields in a positional joint command (`<joint> <angle> <speed>`).
pub const JOINT_COMMAND_ARITY: usize = 3;

/// Parse failures. Both abort the line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// First token is not in the verb table.
    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    /// A fixed-position field is not a valid integer.
    #[error("bad argument '{token}' at position {position}")]
    BadArgument {
        /// Zero-based token position in the line
        position: usize,
        /// Offending token
        token: String,
    },
}

/// Verbs recognized as the first token of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `M80`
    PowerOn,
    /// `M81`
    PowerOff,
    /// `G30`
    Home,
    /// `G1`
    Move,
}

const VERB_TABLE: [(&str, Verb); 4] = [
    ("M80", Verb::PowerOn),
    ("M81", Verb::PowerOff),
    ("G30", Verb::Home),
    ("G1", Verb::Move),
];

impl Verb {
    /// Look up an uppercased token.
    pub fn lookup(token: &str) -> Option<Self> {
        VERB_TABLE
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, verb)| *verb)
    }
}

/// One axis override of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisOverride {
    /// Axis to overwrite
    pub label: AxisLabel,
    /// New slot value
    pub value: i32,
}

/// Arguments of a `G1` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveCommand {
    /// Overrides in first-seen label order; a repeated label keeps its last value.
    pub axis_overrides: Vec<AxisOverride>,
    /// Explicit feed rate, if the line carried an `F` word.
    pub feed_rate: Option<i32>,
}

impl MoveCommand {
    /// Record an override, replacing an earlier one for the same label.
    pub fn set(&mut self, label: AxisLabel, value: i32) {
        match self.axis_overrides.iter_mut().find(|o| o.label == label) {
            Some(existing) => existing.value = value,
            None => self.axis_overrides.push(AxisOverride { label, value }),
        }
    }

    /// Override for `label`, if present.
    pub fn get(&self, label: AxisLabel) -> Option<i32> {
        self.axis_overrides
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.value)
    }
}

/// Structured command produced from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank or comment line.
    NoOp,
    /// Servo power on.
    PowerOn,
    /// Servo power off.
    PowerOff,
    /// Move to the zero joint pose and wait.
    Home,
    /// Override axes of the current pose and move there.
    Move(MoveCommand),
    /// Positional single-joint move (`<joint> <angle> <speed>`).
    Joint {
        /// Joint label (`1`..`6`)
        joint: AxisLabel,
        /// Target angle in degrees
        angle: i32,
        /// Speed
        speed: i32,
    },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "no-op"),
            Self::PowerOn => write!(f, "M80"),
            Self::PowerOff => write!(f, "M81"),
            Self::Home => write!(f, "G30"),
            Self::Move(mv) => {
                write!(f, "G1")?;
                for o in &mv.axis_overrides {
                    write!(f, " {}{}", o.label, o.value)?;
                }
                if let Some(feed) = mv.feed_rate {
                    write!(f, " {FEED_MARKER}{feed}")?;
                }
                Ok(())
            }
            Self::Joint { joint, angle, speed } => write!(f, "J{joint} {angle} @{speed}"),
        }
    }
}

/// A classified `G1` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveToken {
    /// `<AXIS><int>`
    Axis(AxisOverride),
    /// `F<int>`
    Feed(i32),
}

/// Why a `G1` argument was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// First character is neither an axis label nor the feed marker.
    UnknownLabel,
    /// Suffix after the label is not an integer.
    BadNumber,
}

/// A `G1` argument that was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedToken {
    /// The token as received (uppercased)
    pub token: String,
    /// Why it was dropped
    pub reason: SkipReason,
}

/// Classify one `G1` argument.
pub fn classify_move_token(token: &str) -> Result<MoveToken, SkippedToken> {
    let skipped = |reason| SkippedToken {
        token: token.to_string(),
        reason,
    };

    let mut chars = token.chars();
    let Some(head) = chars.next() else {
        return Err(skipped(SkipReason::UnknownLabel));
    };
    let value = chars.as_str();

    if head == FEED_MARKER {
        return value
            .parse()
            .map(MoveToken::Feed)
            .map_err(|_| skipped(SkipReason::BadNumber));
    }

    let label = AxisLabel::from_char(head).ok_or_else(|| skipped(SkipReason::UnknownLabel))?;
    value
        .parse()
        .map(|value| MoveToken::Axis(AxisOverride { label, value }))
        .map_err(|_| skipped(SkipReason::BadNumber))
}

/// Fold classified tokens into a move, logging the skipped ones.
fn fold_move_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> MoveCommand {
    let mut mv = MoveCommand::default();
    for result in tokens.into_iter().map(classify_move_token) {
        match result {
            Ok(MoveToken::Axis(o)) => mv.set(o.label, o.value),
            Ok(MoveToken::Feed(feed)) => mv.feed_rate = Some(feed),
            Err(skipped) => warn!(
                "Skipping move token '{}' ({:?})",
                skipped.token, skipped.reason
            ),
        }
    }
    mv
}

/// Parse exactly `N` integer fields; any non-integer is fatal.
fn fixed_args<const N: usize>(tokens: &[&str]) -> Result<[i32; N], ParseError> {
    let mut out = [0i32; N];
    for (position, slot) in out.iter_mut().enumerate() {
        let token = tokens.get(position).copied().unwrap_or_default();
        *slot = token.parse().map_err(|_| ParseError::BadArgument {
            position,
            token: token.to_string(),
        })?;
    }
    Ok(out)
}

/// Line parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandParser {
    /// Accept `<joint> <angle> <speed>` lines as [`Command::Joint`].
    pub legacy_joint_commands: bool,
}

impl CommandParser {
    /// Create a parser.
    pub fn new(legacy_joint_commands: bool) -> Self {
        Self {
            legacy_joint_commands,
        }
    }

    /// Parse one line.
    pub fn parse(&self, line: &str) -> Result<Command, ParseError> {
        let upper = line.to_uppercase();
        let tokens: Vec<&str> = upper.split_whitespace().collect();

        let Some(&first) = tokens.first() else {
            return Ok(Command::NoOp);
        };
        if first.starts_with(COMMENT_MARKER) {
            return Ok(Command::NoOp);
        }

        let args = &tokens[1..];
        let bare = |cmd: Command| -> Result<Command, ParseError> {
            if !args.is_empty() {
                warn!("Ignoring {} trailing token(s) after {}", args.len(), first);
            }
            Ok(cmd)
        };
        match Verb::lookup(first) {
            Some(Verb::Move) => Ok(Command::Move(fold_move_tokens(args.iter().copied()))),
            Some(Verb::Home) => bare(Command::Home),
            Some(Verb::PowerOn) => bare(Command::PowerOn),
            Some(Verb::PowerOff) => bare(Command::PowerOff),
            None if self.legacy_joint_commands && tokens.len() == JOINT_COMMAND_ARITY => {
                parse_joint(&tokens)
            }
            None => Err(ParseError::UnknownVerb(first.to_string())),
        }
    }
}

fn parse_joint(tokens: &[&str]) -> Result<Command, ParseError> {
    let [joint, angle, speed] = fixed_args::<JOINT_COMMAND_ARITY>(tokens)?;
    let joint = u8::try_from(joint)
        .ok()
        .and_then(AxisLabel::joint)
        .ok_or_else(|| ParseError::BadArgument {
            position: 0,
            token: tokens[0].to_string(),
        })?;
    Ok(Command::Joint {
        joint,
        angle,
        speed,
    })
}

/// Parse one line with default options.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    CommandParser::default().parse(line)
}
