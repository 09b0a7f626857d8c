//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand, ValueEnum};

use crate::auth::Role;
use crate::forms::Stage;
use crate::vehicle::VehicleField;

/// Sign-in arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Account email
    pub email: String,

    /// Account password
    #[arg(short, long, env = "DEALERFLOW_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Admin sign-up arguments.
#[derive(Debug, Args)]
pub struct SignupCommand {
    /// Admin email
    pub email: String,

    /// Organization name
    #[arg(short, long)]
    pub organization: String,

    /// Account password
    #[arg(short, long, env = "DEALERFLOW_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Employee sign-up arguments.
#[derive(Debug, Args)]
pub struct JoinCommand {
    /// Employee email the invitation was issued for
    pub email: String,

    /// Invitation code from the admin
    #[arg(long)]
    pub code: String,

    /// Account password
    #[arg(short, long, env = "DEALERFLOW_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Invitation arguments.
#[derive(Debug, Args)]
pub struct InviteCommand {
    /// Employee email
    pub email: String,

    /// Role granted on sign-up
    #[arg(short, long, value_enum, default_value = "user")]
    pub role: RoleArg,
}

/// New vehicle process arguments.
#[derive(Debug, Args)]
pub struct NewCommand {
    /// Vehicle name, e.g. "2015 Honda Accord"
    pub name: String,

    /// Dealer stock number
    #[arg(short, long, default_value = "")]
    pub stock: String,

    /// VIN, typed or scanned
    #[arg(long)]
    pub vin: Option<String>,
}

/// Vehicle listing arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Checklist display arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Vehicle identifier
    pub car_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Checklist toggle arguments.
#[derive(Debug, Args)]
pub struct ToggleCommand {
    /// Vehicle identifier
    pub car_id: String,

    /// Step index (from 0)
    pub step: usize,

    /// Task index within the step (from 0)
    pub task: usize,
}

/// Step sign-off arguments. At least one of initials or date is required.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("sign_off")
        .required(true)
        .multiple(true)
        .args(["initials", "date", "today"])
))]
pub struct SignStepCommand {
    /// Vehicle identifier
    pub car_id: String,

    /// Step index (from 0)
    pub step: usize,

    /// Initials of whoever completed the step
    #[arg(short, long)]
    pub initials: Option<String>,

    /// Completion date, free text
    #[arg(short, long)]
    pub date: Option<String>,

    /// Use today's date
    #[arg(long, conflicts_with = "date")]
    pub today: bool,
}

/// Stage form arguments.
#[derive(Debug, Args)]
pub struct StageCommand {
    /// Vehicle identifier
    pub car_id: String,

    /// Stage form: input, inspection, body-shop or car-lot
    pub stage: Stage,

    /// Field assignment as `field=value`; shows the form when omitted
    #[arg(short, long = "set", value_parser = parse_assignment)]
    pub assignments: Vec<(VehicleField, String)>,
}

/// Vehicle removal arguments.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Vehicle identifier
    pub car_id: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// VIN entry arguments.
#[derive(Debug, Args)]
pub struct VinCommand {
    /// Typed or scanned VIN
    pub vin: String,

    /// Record the VIN on this vehicle instead of only normalizing it
    #[arg(long)]
    pub car: Option<String>,
}

/// Template and status output arguments.
#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Role argument for invitations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Regular employee
    User,
    /// Organization admin
    Admin,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::User => Self::User,
            RoleArg::Admin => Self::Admin,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

fn parse_assignment(raw: &str) -> Result<(VehicleField, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{raw}'"))?;
    let field = VehicleField::ALL
        .into_iter()
        .find(|f| f.key() == key.trim())
        .ok_or_else(|| format!("unknown field '{}'", key.trim()))?;
    Ok((field, value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_arg_conversion() {
        assert_eq!(Role::from(RoleArg::User), Role::User);
        assert_eq!(Role::from(RoleArg::Admin), Role::Admin);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_parse_assignment() {
        let (field, value) = parse_assignment("repairCost=$1,200").unwrap();
        assert_eq!(field, VehicleField::RepairCost);
        assert_eq!(value, "$1,200");

        let (_, value) = parse_assignment("keyTag=").unwrap();
        assert_eq!(value, "");
    }

    #[test]
    fn test_parse_assignment_errors() {
        assert!(parse_assignment("repairCost").unwrap_err().contains("field=value"));
        assert!(parse_assignment("color=red").unwrap_err().contains("unknown field"));
    }
}
