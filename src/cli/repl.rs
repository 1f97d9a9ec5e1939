//! Lightweight REPL (Read-Eval-Print-Loop) for wallet-coordinator-cli.
//!
//! Provides an interactive mode when no command file is given via `-f`.
//! Each line is one [`ReplCommand`]; `/quit`, `/exit` or `/q` leaves.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use super::bootstrap::CliContext;
use super::runner::execute_command;

/// Help text listing the commands.
pub const HELP: &str = "\
Commands:
  login | logout        authenticate or sign out the wallet
  focus | blur          focus or unfocus the wallet
  loaded                report the current wallet load as finished
  anon <n>              edit the anonymity score target
  pleb <amount>         edit the pleb-stop threshold
  autocj                toggle auto-coinjoin
  profile               select a coinjoin profile
  confirm <prompt>      ask for a confirmation
  wait [ms]             wait (default: twice the quiet window)
  status                show session and coinjoin state
  /quit                 exit";

/// REPL command variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Exit the REPL
    Quit,
    Login,
    Logout,
    Focus,
    Blur,
    Loaded,
    Anon(i64),
    Pleb(String),
    AutoCoinJoin,
    Profile,
    Confirm(String),
    Wait(Option<u64>),
    Status,
    Help,
    /// Known command with bad arguments
    Usage(&'static str),
    /// Unknown command (will show help)
    Unknown(String),
    /// Empty input (skip)
    Empty,
}

impl ReplCommand {
    /// Parse user input into a REPL command.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            return ReplCommand::Empty;
        }

        if trimmed.starts_with('/') {
            return match trimmed.to_lowercase().as_str() {
                "/quit" | "/exit" | "/q" => ReplCommand::Quit,
                "/help" => ReplCommand::Help,
                _ => ReplCommand::Unknown(trimmed.to_string()),
            };
        }

        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };

        match word.to_lowercase().as_str() {
            "login" => ReplCommand::Login,
            "logout" => ReplCommand::Logout,
            "focus" => ReplCommand::Focus,
            "blur" => ReplCommand::Blur,
            "loaded" => ReplCommand::Loaded,
            "anon" => match rest.parse() {
                Ok(n) => ReplCommand::Anon(n),
                Err(_) => ReplCommand::Usage("anon <n>"),
            },
            // Raw text on purpose: the pipeline validates it
            "pleb" if !rest.is_empty() => ReplCommand::Pleb(rest.to_string()),
            "pleb" => ReplCommand::Usage("pleb <amount>"),
            "autocj" => ReplCommand::AutoCoinJoin,
            "profile" => ReplCommand::Profile,
            "confirm" if !rest.is_empty() => ReplCommand::Confirm(rest.to_string()),
            "confirm" => ReplCommand::Usage("confirm <prompt>"),
            "wait" if rest.is_empty() => ReplCommand::Wait(None),
            "wait" => match rest.parse() {
                Ok(ms) => ReplCommand::Wait(Some(ms)),
                Err(_) => ReplCommand::Usage("wait [ms]"),
            },
            "status" => ReplCommand::Status,
            "help" => ReplCommand::Help,
            _ => ReplCommand::Unknown(trimmed.to_string()),
        }
    }
}

/// Run an interactive REPL session.
///
/// Returns when the user exits or on EOF (Ctrl+D).
pub async fn run_repl(ctx: &mut CliContext) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    eprintln!("wallet-coordinator-cli interactive mode");
    eprintln!("Type help for commands, /quit to exit\n");

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF (Ctrl+D)
            eprintln!("\nGoodbye!");
            break;
        }

        match ReplCommand::parse(&input) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => {
                eprintln!("Goodbye!");
                break;
            }
            ReplCommand::Unknown(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                eprintln!("{}", HELP);
            }
            command => {
                if let Err(e) = execute_command(ctx, command).await {
                    eprintln!("Error: {}", e);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ────────────────────────────────────────────────────────────────────────────────
    // Tests for ReplCommand::parse
    // ────────────────────────────────────────────────────────────────────────────────

    mod parse_tests {
        use super::*;

        #[test]
        fn parses_quit_commands() {
            assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/EXIT"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/q\n"), ReplCommand::Quit);
        }

        #[test]
        fn parses_session_commands() {
            assert_eq!(ReplCommand::parse("login"), ReplCommand::Login);
            assert_eq!(ReplCommand::parse("LOGOUT"), ReplCommand::Logout);
            assert_eq!(ReplCommand::parse(" focus "), ReplCommand::Focus);
            assert_eq!(ReplCommand::parse("blur"), ReplCommand::Blur);
            assert_eq!(ReplCommand::parse("loaded"), ReplCommand::Loaded);
            assert_eq!(ReplCommand::parse("status"), ReplCommand::Status);
        }

        #[test]
        fn parses_anon_argument() {
            assert_eq!(ReplCommand::parse("anon 42"), ReplCommand::Anon(42));
            assert_eq!(ReplCommand::parse("anon -1"), ReplCommand::Anon(-1));
            assert_eq!(ReplCommand::parse("anon"), ReplCommand::Usage("anon <n>"));
            assert_eq!(ReplCommand::parse("anon many"), ReplCommand::Usage("anon <n>"));
        }

        #[test]
        fn keeps_pleb_text_raw() {
            assert_eq!(
                ReplCommand::parse("pleb  0.5abc"),
                ReplCommand::Pleb("0.5abc".to_string())
            );
            assert_eq!(ReplCommand::parse("pleb"), ReplCommand::Usage("pleb <amount>"));
        }

        #[test]
        fn confirm_takes_rest_of_line() {
            assert_eq!(
                ReplCommand::parse("confirm Enable Tor?"),
                ReplCommand::Confirm("Enable Tor?".to_string())
            );
        }

        #[test]
        fn parses_wait() {
            assert_eq!(ReplCommand::parse("wait"), ReplCommand::Wait(None));
            assert_eq!(ReplCommand::parse("wait 250"), ReplCommand::Wait(Some(250)));
            assert_eq!(ReplCommand::parse("wait soon"), ReplCommand::Usage("wait [ms]"));
        }

        #[test]
        fn parses_unknown_commands() {
            assert_eq!(
                ReplCommand::parse("/tools"),
                ReplCommand::Unknown("/tools".to_string())
            );
            assert_eq!(
                ReplCommand::parse("send 1 BTC"),
                ReplCommand::Unknown("send 1 BTC".to_string())
            );
        }

        #[test]
        fn skips_empty_and_comment_lines() {
            assert_eq!(ReplCommand::parse(""), ReplCommand::Empty);
            assert_eq!(ReplCommand::parse("  \t\n"), ReplCommand::Empty);
            assert_eq!(ReplCommand::parse("# login first"), ReplCommand::Empty);
        }
    }
}
