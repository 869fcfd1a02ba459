//! Commands and the command-line grammar.
//!
//! This module defines the vocabulary the read loop speaks: [`Command`]
//! describes every action outputctl can perform and [`parse`] turns one line
//! of operator text into a command or a [`CommandError`].
//!
//! ```text
//! list_outputs
//! set_output <name> (<key> <value>)+        1..5 pairs
//! enable_output <name>
//! disable_output <name>
//! monitor [single <timestamp> | period <from> <to>]
//! exit
//! ```
//!
//! `set_output` keys are `mode`, `cmode`, `pos`, `transform`, `scale` and
//! `adaptivesync`.  Values are cross-checked against the registry, so a
//! successful parse refers to heads and modes that existed at parse time.
//! The ids stay meaningful only until the next snapshot-altering event.

use crate::error::CommandError;
use crate::monitor::LogQuery;
use crate::output::{CustomMode, Fixed, Head, HeadId, ModeId, Position, Transform};
use crate::registry::OutputRegistry;
use log::debug;

/// Maximum number of key/value pairs in one `set_output` command.
pub const MAX_SUBCOMMANDS: usize = 5;

/// Every action the read loop can perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print every head and its modes.
    ListOutputs,

    /// Reconfigure one enabled head.
    SetOutput(ChangeRequest),

    /// Turn on a currently disabled head.
    EnableOutput(HeadId),

    /// Turn off a currently enabled head.
    DisableOutput(HeadId),

    /// Print lines of the event log.
    Monitor(LogQuery),

    /// Leave the read loop.
    Exit,
}

/// The mode half of a change request: an advertised mode or explicit numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Advertised(ModeId),
    Custom(CustomMode),
}

/// A validated set of changes to one head.
///
/// `None` means "not requested"; each property can be requested at most
/// once, and a named mode excludes a custom one by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRequest {
    pub head: HeadId,
    pub mode: Option<ModeChange>,
    pub position: Option<Position>,
    pub transform: Option<Transform>,
    pub scale: Option<Fixed>,
    pub adaptive_sync: Option<bool>,
}

impl ChangeRequest {
    pub fn new(head: HeadId) -> Self {
        Self {
            head,
            mode: None,
            position: None,
            transform: None,
            scale: None,
            adaptive_sync: None,
        }
    }
}

//  Parsing

/// Parse one command line against the current registry.
///
/// Validation stops at the first problem; no partially built request ever
/// escapes.
pub fn parse(line: &str, registry: &OutputRegistry) -> Result<Command, CommandError> {
    let tokens = tokenize(line)?;
    let mut tokens = tokens.into_iter();

    match tokens.next() {
        None => Err(CommandError::InvalidMainCommand),
        Some("list_outputs") => Ok(Command::ListOutputs),
        Some("set_output") => parse_set_output(&mut tokens, registry).map(Command::SetOutput),
        Some("enable_output") => {
            let head = parse_toggle_target(&mut tokens, registry, false)?;
            Ok(Command::EnableOutput(head))
        }
        Some("disable_output") => {
            let head = parse_toggle_target(&mut tokens, registry, true)?;
            Ok(Command::DisableOutput(head))
        }
        Some("monitor") => parse_monitor(&mut tokens).map(Command::Monitor),
        Some("exit") => Ok(Command::Exit),
        Some(other) => {
            debug!("unrecognized command {:?}", other);
            Err(CommandError::InvalidMainCommand)
        }
    }
}

fn tokenize(line: &str) -> Result<Vec<&str>, CommandError> {
    let count = line.split_whitespace().count();
    let mut tokens = Vec::new();
    tokens
        .try_reserve_exact(count)
        .map_err(|_| CommandError::AllocationFailed)?;
    tokens.extend(line.split_whitespace());
    Ok(tokens)
}

fn parse_set_output<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    registry: &OutputRegistry,
) -> Result<ChangeRequest, CommandError> {
    let name = tokens.next().ok_or(CommandError::CommandIncomplete)?;
    let head = registry
        .head_by_name(name)
        .filter(|h| h.enabled)
        .ok_or(CommandError::InvalidOutputHead)?;

    let mut request = ChangeRequest::new(head.id);
    let mut pairs = 0;

    while let Some(key) = tokens.next() {
        if pairs >= MAX_SUBCOMMANDS {
            return Err(CommandError::ExceededMaxSubcommands);
        }
        let value = tokens.next().ok_or(CommandError::InvalidSubcommand)?;
        pairs += 1;
        apply_pair(&mut request, head, key, value)?;
        debug!("valid {} sub-option for {}", key, head.display_name());
    }

    if pairs == 0 {
        return Err(CommandError::NoSubcommands);
    }
    Ok(request)
}

fn apply_pair(
    request: &mut ChangeRequest,
    head: &Head,
    key: &str,
    value: &str,
) -> Result<(), CommandError> {
    match key {
        "mode" => {
            // A previous `cmode` also occupies the mode slot.
            if request.mode.is_some() {
                return Err(CommandError::InvalidMode);
            }
            let (width, height, refresh) =
                parse_mode_triple(value).ok_or(CommandError::InvalidMode)?;
            let mode = head
                .find_mode(width, height, refresh)
                .ok_or(CommandError::InvalidMode)?;
            request.mode = Some(ModeChange::Advertised(mode.id));
        }
        "cmode" => {
            if request.mode.is_some() {
                return Err(CommandError::InvalidCustomMode);
            }
            let (width, height, refresh) =
                parse_mode_triple(value).ok_or(CommandError::InvalidCustomMode)?;
            request.mode = Some(ModeChange::Custom(CustomMode {
                width,
                height,
                refresh,
            }));
        }
        "pos" => {
            if request.position.is_some() {
                return Err(CommandError::InvalidPosition);
            }
            let (x, y) = parse_pair(value).ok_or(CommandError::InvalidPosition)?;
            request.position = Some(Position { x, y });
        }
        "transform" => {
            if request.transform.is_some() {
                return Err(CommandError::InvalidTransform);
            }
            let transform = value
                .parse::<u32>()
                .ok()
                .and_then(|raw| Transform::try_from(raw).ok())
                .ok_or(CommandError::InvalidTransform)?;
            request.transform = Some(transform);
        }
        "scale" => {
            if request.scale.is_some() {
                return Err(CommandError::InvalidScale);
            }
            request.scale = Some(parse_scale(value).ok_or(CommandError::InvalidScale)?);
        }
        "adaptivesync" => {
            if request.adaptive_sync.is_some() {
                return Err(CommandError::InvalidAdaptiveSync);
            }
            request.adaptive_sync = Some(match value {
                "0" => false,
                "1" => true,
                _ => return Err(CommandError::InvalidAdaptiveSync),
            });
        }
        _ => return Err(CommandError::InvalidSubcommand),
    }
    Ok(())
}

/// `<int>,<int>@<int>`
fn parse_mode_triple(s: &str) -> Option<(i32, i32, i32)> {
    let (size, refresh) = s.split_once('@')?;
    let (width, height) = parse_pair(size)?;
    Some((width, height, refresh.parse().ok()?))
}

/// `<int>,<int>`
fn parse_pair(s: &str) -> Option<(i32, i32)> {
    let (a, b) = s.split_once(',')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

/// A finite, strictly positive scale that survives fixed-point conversion.
fn parse_scale(s: &str) -> Option<Fixed> {
    let value: f64 = s.parse().ok()?;
    if value.is_nan() || value <= 0.0 {
        return None;
    }
    Fixed::from_f64(value).filter(|f| f.raw() > 0)
}

fn parse_toggle_target<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    registry: &OutputRegistry,
    currently_enabled: bool,
) -> Result<HeadId, CommandError> {
    let name = tokens.next().ok_or(CommandError::CommandIncomplete)?;
    let head = registry
        .head_by_name(name)
        .filter(|h| h.enabled == currently_enabled)
        .ok_or(CommandError::InvalidOutputHead)?;
    if tokens.next().is_some() {
        return Err(CommandError::InvalidSubcommand);
    }
    Ok(head.id)
}

fn parse_monitor<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<LogQuery, CommandError> {
    let query = match tokens.next() {
        None => return Ok(LogQuery::All),
        Some("single") => {
            let at = tokens.next().ok_or(CommandError::InvalidMonitorSingle)?;
            LogQuery::Single(at.to_string())
        }
        Some("period") => {
            let from = tokens.next().ok_or(CommandError::InvalidMonitorPeriod)?;
            let to = tokens.next().ok_or(CommandError::InvalidMonitorPeriod)?;
            LogQuery::Period {
                from: from.to_string(),
                to: to.to_string(),
            }
        }
        Some(_) => return Err(CommandError::InvalidMonitorCommand),
    };
    if tokens.next().is_some() {
        return Err(CommandError::InvalidMonitorMultiple);
    }
    Ok(query)
}
