use std::env;

use clap::{Args, Subcommand};

use crate::cli::common::{build_client, print_session_details};

const USER_AGENT: &str = "clinic-cli-auth/0.1";

#[derive(Debug, Args)]
pub(crate) struct AuthCommand {
    #[command(subcommand)]
    subcmd: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Sign in and persist the session.
    Login(LoginCommand),

    /// Show the stored session.
    Status(StatusCommand),

    /// Sign out and remove the stored session.
    Logout(LogoutCommand),
}

impl AuthCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        match &self.subcmd {
            AuthSubcommand::Login(cmd) => cmd.run().await,
            AuthSubcommand::Status(cmd) => cmd.run().await,
            AuthSubcommand::Logout(cmd) => cmd.run().await,
        }
    }
}

#[derive(Debug, Args)]
struct LoginCommand {
    #[arg(long)]
    email: String,

    /// Falls back to `CLINIC_PASSWORD`.
    #[arg(long)]
    password: Option<String>,
}

impl LoginCommand {
    async fn run(&self) -> anyhow::Result<()> {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => env::var("CLINIC_PASSWORD")
                .map_err(|_| anyhow::anyhow!("provide --password or set CLINIC_PASSWORD"))?,
        };

        let client = build_client(USER_AGENT)?;
        let session = client.auth().login(&self.email, &password).await?;
        println!("Signed in as {}.", self.email);
        print_session_details(&session);
        Ok(())
    }
}

#[derive(Debug, Args)]
struct StatusCommand {
    /// Ask the backend who the session belongs to.
    #[arg(long)]
    remote: bool,
}

impl StatusCommand {
    async fn run(&self) -> anyhow::Result<()> {
        let client = build_client(USER_AGENT)?;
        let session = client.session().get();
        if !session.is_authenticated() {
            println!("No stored session.");
            return Ok(());
        }

        if self.remote {
            let user = client.auth().me().await?;
            println!("Backend reports user {}.", user.id);
        }
        print_session_details(&client.session().get());
        Ok(())
    }
}

#[derive(Debug, Args)]
struct LogoutCommand {}

impl LogoutCommand {
    async fn run(&self) -> anyhow::Result<()> {
        let client = build_client(USER_AGENT)?;
        if client.auth().logout().await {
            println!("Signed out and cleared stored session.");
        } else {
            println!("No stored session.");
        }
        Ok(())
    }
}
