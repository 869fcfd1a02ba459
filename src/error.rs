//! Command error taxonomy.
//!
//! The numeric codes are part of the user-facing contract: scripts match on
//! them, so they must never be renumbered.

/// Every way a command line can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum CommandError {
    #[error("unrecognized command")]
    InvalidMainCommand,
    #[error("command incomplete: missing output name")]
    CommandIncomplete,
    #[error("no matching output in the required state")]
    InvalidOutputHead,
    #[error("too many sub-options (at most {})", crate::command::MAX_SUBCOMMANDS)]
    ExceededMaxSubcommands,
    #[error("no sub-options given")]
    NoSubcommands,
    #[error("unrecognized or incomplete sub-option")]
    InvalidSubcommand,
    #[error("could not allocate memory for the command")]
    AllocationFailed,
    #[error("invalid mode: expected <width>,<height>@<refresh> of an advertised mode")]
    InvalidMode,
    #[error("invalid custom mode: expected <width>,<height>@<refresh>")]
    InvalidCustomMode,
    #[error("invalid position: expected <x>,<y>")]
    InvalidPosition,
    #[error("invalid transform: expected an integer from 0 to 7")]
    InvalidTransform,
    #[error("invalid scale: expected a number that stays positive after 1/256 rounding")]
    InvalidScale,
    #[error("invalid adaptive sync value: expected 0 or 1")]
    InvalidAdaptiveSync,
    #[error("invalid monitor command: expected `single` or `period`")]
    InvalidMonitorCommand,
    #[error("could not read the event log")]
    LogFileError,
    #[error("monitor single: missing timestamp")]
    InvalidMonitorSingle,
    #[error("monitor period: expected two timestamps")]
    InvalidMonitorPeriod,
    #[error("monitor: unexpected extra arguments")]
    InvalidMonitorMultiple,
}

impl CommandError {
    pub const ALL: [CommandError; 18] = [
        CommandError::InvalidMainCommand,
        CommandError::CommandIncomplete,
        CommandError::InvalidOutputHead,
        CommandError::ExceededMaxSubcommands,
        CommandError::NoSubcommands,
        CommandError::InvalidSubcommand,
        CommandError::AllocationFailed,
        CommandError::InvalidMode,
        CommandError::InvalidCustomMode,
        CommandError::InvalidPosition,
        CommandError::InvalidTransform,
        CommandError::InvalidScale,
        CommandError::InvalidAdaptiveSync,
        CommandError::InvalidMonitorCommand,
        CommandError::LogFileError,
        CommandError::InvalidMonitorSingle,
        CommandError::InvalidMonitorPeriod,
        CommandError::InvalidMonitorMultiple,
    ];

    /// Stable numeric code.  `0` is reserved for "no error".
    pub fn code(self) -> u32 {
        match self {
            CommandError::InvalidMainCommand => 1,
            CommandError::CommandIncomplete => 2,
            CommandError::InvalidOutputHead => 3,
            CommandError::ExceededMaxSubcommands => 4,
            CommandError::NoSubcommands => 5,
            CommandError::InvalidSubcommand => 6,
            CommandError::AllocationFailed => 7,
            CommandError::InvalidMode => 8,
            CommandError::InvalidCustomMode => 9,
            CommandError::InvalidPosition => 10,
            CommandError::InvalidTransform => 11,
            CommandError::InvalidScale => 12,
            CommandError::InvalidAdaptiveSync => 13,
            CommandError::InvalidMonitorCommand => 14,
            CommandError::LogFileError => 15,
            CommandError::InvalidMonitorSingle => 16,
            CommandError::InvalidMonitorPeriod => 17,
            CommandError::InvalidMonitorMultiple => 18,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Stable message name, e.g. `INVALID_SUBCOMMAND_SCALE`.
    pub fn name(self) -> &'static str {
        match self {
            CommandError::InvalidMainCommand => "INVALID_MAIN_COMMAND",
            CommandError::CommandIncomplete => "COMMAND_INCOMPLETE",
            CommandError::InvalidOutputHead => "INVALID_OUTPUT_HEAD",
            CommandError::ExceededMaxSubcommands => "EXCEEDED_MAX_SUBCMDS",
            CommandError::NoSubcommands => "NO_SUBCOMMANDS",
            CommandError::InvalidSubcommand => "INVALID_SUBCOMMAND",
            CommandError::AllocationFailed => "MEMORY_NOT_ALLOCATED",
            CommandError::InvalidMode => "INVALID_SUBCOMMAND_MODE",
            CommandError::InvalidCustomMode => "INVALID_SUBCOMMAND_CMODE",
            CommandError::InvalidPosition => "INVALID_SUBCOMMAND_POS",
            CommandError::InvalidTransform => "INVALID_SUBCOMMAND_TRANSFORM",
            CommandError::InvalidScale => "INVALID_SUBCOMMAND_SCALE",
            CommandError::InvalidAdaptiveSync => "INVALID_SUBCOMMAND_ADAPTIVE_SYNC",
            CommandError::InvalidMonitorCommand => "INVALID_MONITOR_COMMAND",
            CommandError::LogFileError => "LOG_FILE_ERROR",
            CommandError::InvalidMonitorSingle => "INVALID_MONITOR_SINGLE",
            CommandError::InvalidMonitorPeriod => "INVALID_MONITOR_PERIOD",
            CommandError::InvalidMonitorMultiple => "INVALID_MONITOR_MULTIPLE",
        }
    }
}

/// Message name for a raw result code, including `0` and unknown codes.
pub fn error_name(code: u32) -> &'static str {
    match code {
        0 => "NO_ERROR",
        other => CommandError::from_code(other)
            .map(CommandError::name)
            .unwrap_or("UNKNOWN_ERROR"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_contiguous() {
        let codes: Vec<u32> = CommandError::ALL.iter().map(|e| e.code()).collect();
        assert_eq!(codes, (1..=18).collect::<Vec<u32>>());
    }

    #[test]
    fn code_round_trips_through_lookup() {
        for e in CommandError::ALL {
            assert_eq!(CommandError::from_code(e.code()), Some(e));
        }
        assert_eq!(CommandError::from_code(0), None);
        assert_eq!(CommandError::from_code(19), None);
    }

    #[test]
    fn names_for_raw_codes() {
        assert_eq!(error_name(0), "NO_ERROR");
        assert_eq!(error_name(8), "INVALID_SUBCOMMAND_MODE");
        assert_eq!(error_name(12), "INVALID_SUBCOMMAND_SCALE");
        assert_eq!(error_name(99), "UNKNOWN_ERROR");
    }

    #[test]
    fn display_mentions_limit() {
        let msg = CommandError::ExceededMaxSubcommands.to_string();
        assert!(msg.contains('5'), "got {msg}");
    }

    #[test]
    fn scale_message_names_rounding_step() {
        let msg = CommandError::InvalidScale.to_string();
        assert!(msg.contains("1/256"), "got {msg}");
    }
}
