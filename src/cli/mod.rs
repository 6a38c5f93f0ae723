//! CLI module - Command-line interface for marzban-manager
//!
//! Every subcommand validates its parameters through clap and then calls into
//! the batch engine; only the `menu` command prompts on stdin.

pub mod commands;

use crate::config::Config;
use crate::domain::UserStatus;
use crate::services::Sign;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// marzban-manager - bulk administration of panel users
#[derive(Parser, Debug)]
#[command(name = "marzban-manager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config.toml (default: search the usual locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Panel domain, without scheme or port
    #[arg(long, global = true)]
    pub domain: Option<String>,

    /// Panel port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Panel admin username
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Panel admin password
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Command-line flags win over the config file and the environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(domain) = &self.domain {
            config.panel.domain.clone_from(domain);
        }
        if let Some(port) = self.port {
            config.panel.port = port;
        }
        if let Some(username) = &self.username {
            config.panel.username.clone_from(username);
        }
        if let Some(password) = &self.password {
            config.panel.password.clone_from(password);
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive menu (default)
    Menu,

    /// Traffic and status totals
    #[command(alias = "statistics")]
    Stats {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List users
    #[command(alias = "ls")]
    Users {
        /// One of on_hold, disabled, active, expired, limited; anything else lists all
        #[arg(long)]
        status: Option<String>,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Print the users as JSON
        #[arg(long)]
        json: bool,
    },

    /// Increase or decrease the traffic quota of active users
    #[command(group(ArgGroup::new("quantity").required(true).args(["amount", "coefficient"])))]
    Traffic {
        direction: Direction,

        /// Amount in GiB added to or removed from each quota
        #[arg(long)]
        amount: Option<f64>,

        /// Multiplier applied to each quota
        #[arg(long)]
        coefficient: Option<f64>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Move the expiry of active users
    Days {
        direction: Direction,

        /// Days added to each expiry
        #[arg(long, allow_negative_numbers = true)]
        days: i64,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Delete users that have been offline for longer than a threshold
    #[command(alias = "rm")]
    Delete {
        /// Minimum days since the user was last online
        #[arg(long)]
        idle_days: u32,

        /// Only users with this status (on_hold, disabled, active, expired, limited)
        #[arg(long)]
        status: Option<String>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Disable active users or re-enable disabled ones
    Status {
        toggle: StatusToggle,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Create default config file
    Init,
}

/// Which users an operation covers: everyone the session sees, users with a
/// username prefix, or the users of another admin.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Only users whose username starts with this prefix
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Operate on the users of this admin
    #[arg(long, requires = "admin_password")]
    pub admin_username: Option<String>,

    /// Password of --admin-username
    #[arg(long, requires = "admin_username")]
    pub admin_password: Option<String>,
}

impl ScopeArgs {
    #[must_use]
    pub fn into_scope(self) -> commands::Scope {
        commands::Scope {
            prefix: self.prefix,
            admin: self.admin_username.zip(self.admin_password),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl From<Direction> for Sign {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Increase => Self::Plus,
            Direction::Decrease => Self::Minus,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusToggle {
    /// active -> disabled
    Disable,
    /// disabled -> active
    Enable,
}

impl StatusToggle {
    /// `(listed status, new status)`
    #[must_use]
    pub const fn transition(self) -> (UserStatus, UserStatus) {
        match self {
            Self::Disable => (UserStatus::Active, UserStatus::Disabled),
            Self::Enable => (UserStatus::Disabled, UserStatus::Active),
        }
    }
}
