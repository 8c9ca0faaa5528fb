// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin digest command parser.
//!
//! Parsing only: mapping a recognized command to store mutations and
//! registry calls happens in the serve wiring. Unrecognized slash commands
//! are ignored (they may belong to other bots in the group).

/// A recognized digest command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestCommand {
    /// `/digest` -- on-demand preview of today's digest.
    Preview,
    /// `/digest_time HH:MM`
    SetTime(String),
    /// `/digest_timezone <iana-zone>`
    SetTimezone(String),
    /// `/digest_mention <tag>`
    SetMention(String),
    /// `/digest_on`
    Enable,
    /// `/digest_off`
    Disable,
    /// `/optout` -- hide the sender's messages from digests.
    OptOut,
    /// `/optin`
    OptIn,
    /// `/digest_help`
    Help,
}

/// Usage text replied to malformed commands and `/digest_help`.
pub const USAGE: &str = "\
Digest commands:\n\
/digest -- preview today's digest\n\
/digest_time HH:MM -- set the daily delivery time\n\
/digest_timezone <zone> -- set the IANA timezone (e.g. Europe/Berlin)\n\
/digest_mention <tag> -- set who the digest addresses\n\
/digest_on, /digest_off -- enable or disable the daily digest\n\
/optout, /optin -- exclude or include your messages";

/// Parse a message text as a digest command.
///
/// Returns `None` when the text is not a digest command at all, and
/// `Some(Err(usage))` when a digest command is missing its argument.
/// A `@botname` suffix on the command token is accepted and ignored.
pub fn parse_command(text: &str) -> Option<Result<DigestCommand, String>> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let mut parts = text.splitn(2, char::is_whitespace);
    let token = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    // "/digest_time@my_bot" addresses this bot explicitly.
    let command = token.split('@').next().unwrap_or(token);

    let parsed = match command {
        "/digest" => Ok(DigestCommand::Preview),
        "/digest_time" => match arg {
            Some(value) => Ok(DigestCommand::SetTime(value.to_string())),
            None => Err(USAGE.to_string()),
        },
        "/digest_timezone" => match arg {
            Some(value) => Ok(DigestCommand::SetTimezone(value.to_string())),
            None => Err(USAGE.to_string()),
        },
        "/digest_mention" => match arg {
            Some(value) => Ok(DigestCommand::SetMention(value.to_string())),
            None => Err(USAGE.to_string()),
        },
        "/digest_on" => Ok(DigestCommand::Enable),
        "/digest_off" => Ok(DigestCommand::Disable),
        "/optout" => Ok(DigestCommand::OptOut),
        "/optin" => Ok(DigestCommand::OptIn),
        "/digest_help" => Ok(DigestCommand::Help),
        _ => return None,
    };

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert!(parse_command("hello there").is_none());
        assert!(parse_command("digest please").is_none());
    }

    #[test]
    fn foreign_commands_are_ignored() {
        assert!(parse_command("/start").is_none());
        assert!(parse_command("/weather Berlin").is_none());
    }

    #[test]
    fn preview_and_toggles_parse() {
        assert_eq!(parse_command("/digest"), Some(Ok(DigestCommand::Preview)));
        assert_eq!(parse_command("/digest_on"), Some(Ok(DigestCommand::Enable)));
        assert_eq!(parse_command("/digest_off"), Some(Ok(DigestCommand::Disable)));
        assert_eq!(parse_command("/optout"), Some(Ok(DigestCommand::OptOut)));
        assert_eq!(parse_command("/optin"), Some(Ok(DigestCommand::OptIn)));
    }

    #[test]
    fn argument_commands_capture_their_argument() {
        assert_eq!(
            parse_command("/digest_time 08:30"),
            Some(Ok(DigestCommand::SetTime("08:30".to_string())))
        );
        assert_eq!(
            parse_command("/digest_timezone Europe/Berlin"),
            Some(Ok(DigestCommand::SetTimezone("Europe/Berlin".to_string())))
        );
        assert_eq!(
            parse_command("/digest_mention @team"),
            Some(Ok(DigestCommand::SetMention("@team".to_string())))
        );
    }

    #[test]
    fn missing_argument_yields_usage() {
        let result = parse_command("/digest_time").unwrap();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("/digest_time HH:MM"));
    }

    #[test]
    fn bot_name_suffix_is_accepted() {
        assert_eq!(
            parse_command("/digest@digestif_bot"),
            Some(Ok(DigestCommand::Preview))
        );
        assert_eq!(
            parse_command("/digest_time@digestif_bot 21:00"),
            Some(Ok(DigestCommand::SetTime("21:00".to_string())))
        );
    }

    #[test]
    fn argument_whitespace_is_trimmed() {
        assert_eq!(
            parse_command("/digest_time   21:00  "),
            Some(Ok(DigestCommand::SetTime("21:00".to_string())))
        );
    }
}
