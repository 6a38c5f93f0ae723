//! Interactive menu.
//!
//! Collects panel settings and job parameters from the operator, then calls
//! the same handlers as the non-interactive subcommands.

use super::{Scope, Session, cmd_days, cmd_delete, cmd_stats, cmd_status, cmd_traffic};
use crate::cli::{Direction, StatusToggle};
use crate::config::Config;
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Stdin, Stdout, Write};
use std::str::FromStr;
use tracing::error;

const MAIN_MENU: [&str; 5] = [
    "User statistics",
    "Increase(+) or Decrease(-) traffic of users",
    "Increase(+) or Decrease(-) days of users",
    "Delete users with filters",
    "Disable/Activate users with filters",
];

const SCOPE_MENU: [&str; 3] = ["All users", "Users of an admin", "Users with prefixes"];

const DIRECTION_MENU: [&str; 2] = ["Increase (+)", "Decrease (-)"];

/// Line-oriented prompts over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<BufReader<Stdin>, Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    /// Prints `label` and returns the trimmed answer.
    pub fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            anyhow::bail!("Input closed");
        }
        Ok(line.trim().to_string())
    }

    /// A single token: empty answers and answers containing spaces are rejected.
    pub fn ask_token(&mut self, label: &str) -> Result<Option<String>> {
        let answer = self.ask(label)?;
        if answer.is_empty() || answer.contains(char::is_whitespace) {
            return Ok(None);
        }
        Ok(Some(answer))
    }

    pub fn ask_parse<T: FromStr>(&mut self, label: &str) -> Result<Option<T>> {
        Ok(self.ask(label)?.parse().ok())
    }

    /// Numbered menu; returns the zero-based index of a valid choice.
    pub fn choose(&mut self, title: &str, options: &[&str]) -> Result<Option<usize>> {
        writeln!(self.output)?;
        writeln!(self.output, "{title}")?;
        writeln!(self.output)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "{}) {option}", i + 1)?;
        }

        let choice = self.ask_parse::<usize>("\nPlease select an option number: ")?;
        Ok(choice.filter(|n| (1..=options.len()).contains(n)).map(|n| n - 1))
    }

    pub fn confirm(&mut self, label: &str) -> Result<bool> {
        Ok(self.ask(label)? == "y")
    }

    /// Asks for every panel setting that is still empty.
    pub fn fill_panel_settings(&mut self, config: &mut Config) -> Result<()> {
        if config.panel.domain.is_empty() {
            config.panel.domain = self.ask("Please enter panel domain (without https and port): ")?;
        }
        if config.panel.username.is_empty() {
            config.panel.username = self.ask("Please enter panel username: ")?;
        }
        if config.panel.password.is_empty() {
            config.panel.password = self.ask("Please enter panel password: ")?;
        }
        if config.panel.domain.is_empty() || !config.panel.has_credentials() {
            anyhow::bail!("Panel domain, username and password are required");
        }

        let port = self.ask(&format!("Please enter panel port [{}]: ", config.panel.port))?;
        if !port.is_empty() {
            config.panel.port = port
                .parse()
                .with_context(|| format!("Invalid port: {port}"))?;
        }
        Ok(())
    }

    pub fn ask_scope(&mut self) -> Result<Option<Scope>> {
        let scope = match self.choose("Which category of users do you want to apply to?", &SCOPE_MENU)? {
            Some(0) => Some(Scope::default()),
            Some(1) => {
                let username = self.ask_token("Please enter admin username: ")?;
                let password = self.ask_token("Please enter admin password: ")?;
                username.zip(password).map(|admin| Scope {
                    prefix: String::new(),
                    admin: Some(admin),
                })
            }
            Some(2) => self.ask_token("Please enter a prefix: ")?.map(|prefix| Scope {
                prefix,
                admin: None,
            }),
            _ => None,
        };
        Ok(scope)
    }

    fn ask_direction(&mut self) -> Result<Option<Direction>> {
        Ok(
            match self.choose("Do you want to increase or decrease?", &DIRECTION_MENU)? {
                Some(0) => Some(Direction::Increase),
                Some(1) => Some(Direction::Decrease),
                _ => None,
            },
        )
    }
}

/// Runs the menu loop until the operator stops answering `y`.
pub async fn cmd_menu(config: &mut Config) -> Result<()> {
    let mut prompter = Prompter::stdio();
    prompter.fill_panel_settings(config)?;

    let session = Session::connect(config).await?;

    loop {
        let result = match prompter.choose("Welcome to marzban-manager", &MAIN_MENU)? {
            Some(0) => statistics(&session, &mut prompter).await,
            Some(1) => traffic(&session, &mut prompter).await,
            Some(2) => days(&session, &mut prompter).await,
            Some(3) => delete(&session, &mut prompter).await,
            Some(4) => status(&session, &mut prompter).await,
            _ => invalid(&mut prompter),
        };

        if let Err(e) = result {
            error!(error = %e, "Operation failed");
            prompter.say(&format!("❌ {e:#}"))?;
        }

        if !prompter.confirm("\n\n\tDo you want to continue (y/n)? ")? {
            break;
        }
    }

    Ok(())
}

fn invalid<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<()> {
    prompter.say("❌ Not correct, please try again.")
}

async fn statistics<R: BufRead, W: Write>(
    session: &Session,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let Some(scope) = prompter.ask_scope()? else {
        return invalid(prompter);
    };
    cmd_stats(session, &scope, false).await
}

async fn traffic<R: BufRead, W: Write>(
    session: &Session,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let Some(direction) = prompter.ask_direction()? else {
        return invalid(prompter);
    };

    let mode = prompter.choose(
        "Do you want to apply a number or a coefficient?",
        &["Number (like: 10 GiB, 25 GiB)", "Coefficient (like: 1.10, 2.0)"],
    )?;
    let (amount, coefficient) = match mode {
        Some(0) => (
            prompter.ask_parse::<f64>("Please enter number of GiB (like 10, 25, 40): ")?,
            None,
        ),
        Some(1) => (
            None,
            prompter.ask_parse::<f64>("Please enter coefficient (like 1.05, 1.22, 2.10): ")?,
        ),
        _ => return invalid(prompter),
    };
    if amount.is_none() && coefficient.is_none() {
        return invalid(prompter);
    }

    let Some(scope) = prompter.ask_scope()? else {
        return invalid(prompter);
    };
    cmd_traffic(session, direction, amount, coefficient, &scope).await
}

async fn days<R: BufRead, W: Write>(
    session: &Session,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let Some(direction) = prompter.ask_direction()? else {
        return invalid(prompter);
    };
    let Some(days) = prompter.ask_parse::<i64>("How many days do you want to add (like: 10, 1, 5)? ")?
    else {
        return invalid(prompter);
    };
    let Some(scope) = prompter.ask_scope()? else {
        return invalid(prompter);
    };
    cmd_days(session, direction, days, &scope).await
}

async fn delete<R: BufRead, W: Write>(
    session: &Session,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let Some(idle_days) =
        prompter.ask_parse::<u32>("What is the minimum time since users were last online (days)? ")?
    else {
        return invalid(prompter);
    };

    let status = match prompter.choose(
        "Users of which status should be deleted?",
        &["All statuses", "Active", "Disabled", "Limited", "Expired"],
    )? {
        Some(0) => None,
        Some(1) => Some("active"),
        Some(2) => Some("disabled"),
        Some(3) => Some("limited"),
        Some(4) => Some("expired"),
        _ => return invalid(prompter),
    };

    let Some(scope) = prompter.ask_scope()? else {
        return invalid(prompter);
    };
    cmd_delete(session, idle_days, status, &scope).await
}

async fn status<R: BufRead, W: Write>(
    session: &Session,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let toggle = match prompter.choose(
        "Which status change do you want?",
        &["active to disabled", "disabled to active"],
    )? {
        Some(0) => StatusToggle::Disable,
        Some(1) => StatusToggle::Enable,
        _ => return invalid(prompter),
    };

    let Some(scope) = prompter.ask_scope()? else {
        return invalid(prompter);
    };
    cmd_status(session, toggle, &scope).await
}
