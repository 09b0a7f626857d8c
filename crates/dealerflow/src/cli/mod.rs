//! Command-line interface for dealerflow.
//!
//! This module provides the CLI structure for the `dealerflow` binary. Each
//! subcommand maps onto one screen action.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, FormatArgs, InviteCommand, JoinCommand, ListCommand, LoginCommand, NewCommand,
    OutputFormat, RemoveCommand, RoleArg, ShowCommand, SignStepCommand, SignupCommand,
    StageCommand, ToggleCommand, VinCommand,
};

/// dealerflow - Track vehicles through the dealership reconditioning workflow
///
/// Each vehicle carries a four-step checklist plus per-stage status fields.
/// Sign in once; the session is kept until `logout`.
#[derive(Debug, Parser)]
#[command(name = "dealerflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in
    Login(LoginCommand),

    /// Sign out
    Logout,

    /// Show the signed-in user and role
    Whoami,

    /// Create an admin account and organization
    Signup(SignupCommand),

    /// Create an employee account from an invitation
    Join(JoinCommand),

    /// Invite an employee (admin only)
    Invite(InviteCommand),

    /// Start a new vehicle process
    New(NewCommand),

    /// List vehicles
    List(ListCommand),

    /// Show a vehicle's checklist
    Show(ShowCommand),

    /// Flip one checklist task and save
    Toggle(ToggleCommand),

    /// Set a step's initials and date and save
    SignStep(SignStepCommand),

    /// Show or edit a stage form
    Stage(StageCommand),

    /// Remove a vehicle (admin only)
    Remove(RemoveCommand),

    /// Normalize a VIN, optionally recording it on a vehicle
    Vin(VinCommand),

    /// Print the checklist template
    Template(FormatArgs),

    /// Show store status
    Status(FormatArgs),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
