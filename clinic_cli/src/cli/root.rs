use clap::{ArgAction, Parser, Subcommand};

use crate::cli::{
    appointments::AppointmentsCommand, auth::AuthCommand, catalog::CatalogCommand,
    inquiries::InquiriesCommand, patients::PatientsCommand, users::UsersCommand,
};

pub(crate) fn get_args() -> CliOpts {
    CliOpts::parse()
}

/// Operator client for the clinic administration backend.
///
/// Reads `CLINIC_API_URL` (required), `CLINIC_USER_AGENT`,
/// `CLINIC_REFRESH_PATH`, `CLINIC_PROFILE` and `CLINIC_SESSION_STORE`
/// (`keyring` or `file`).
#[derive(Debug, Parser)]
#[command(version = clap::crate_version!())]
pub(crate) struct CliOpts {
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    subcmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in, inspect or end the stored session.
    Auth(AuthCommand),

    /// Patient records.
    Patients(PatientsCommand),

    /// Appointment scheduling.
    Appointments(AppointmentsCommand),

    /// Staff accounts.
    Users(UsersCommand),

    /// Inbound contact requests.
    Inquiries(InquiriesCommand),

    /// Services and appointment statuses.
    Catalog(CatalogCommand),
}

impl CliOpts {
    pub(crate) fn verbose(&self) -> u8 {
        self.verbose
    }

    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        match &self.subcmd {
            Command::Auth(cmd) => cmd.run().await,
            Command::Patients(cmd) => cmd.run().await,
            Command::Appointments(cmd) => cmd.run().await,
            Command::Users(cmd) => cmd.run().await,
            Command::Inquiries(cmd) => cmd.run().await,
            Command::Catalog(cmd) => cmd.run().await,
        }
    }
}
