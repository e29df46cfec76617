use clap::{Args, Subcommand};
use clinic_core::{StaffUser, StaffUserInput, UserId};

use crate::cli::common::{ListArgs, or_none, print_page, resolve, signed_in_client};

const USER_AGENT: &str = "clinic-cli-users/0.1";

#[derive(Debug, Args)]
pub(crate) struct UsersCommand {
    #[command(subcommand)]
    subcmd: UsersSubcommand,
}

#[derive(Debug, Subcommand)]
enum UsersSubcommand {
    /// List one page of staff accounts.
    List(ListArgs),

    /// Show one staff account.
    Get(IdArgs),

    /// Create a staff account.
    Create(UserArgs),

    /// Change a staff account.
    Update(UpdateArgs),

    /// Remove a staff account.
    Delete(IdArgs),
}

#[derive(Debug, Args)]
struct IdArgs {
    id: String,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: String,

    #[command(flatten)]
    fields: UserArgs,
}

#[derive(Debug, Args)]
struct UserArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// Falls back to `CLINIC_NEW_USER_PASSWORD` on create.
    #[arg(long)]
    password: Option<String>,

    #[arg(long)]
    role: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    active: Option<bool>,
}

impl UserArgs {
    fn input(&self) -> StaffUserInput {
        StaffUserInput {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            role: self.role.clone(),
            phone: self.phone.clone(),
            active: self.active,
        }
    }
}

impl UsersCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        let client = signed_in_client(USER_AGENT)?;
        let users = client.users();

        match &self.subcmd {
            UsersSubcommand::List(args) => {
                let page = resolve(users.list(&args.params())).await?;
                print_page(&page, summary);
            }
            UsersSubcommand::Get(args) => {
                let user = resolve(users.get(&UserId::new(args.id.as_str()))).await?;
                print_details(&user);
            }
            UsersSubcommand::Create(args) => {
                let mut input = args.input();
                if input.password.is_none() {
                    input.password = std::env::var("CLINIC_NEW_USER_PASSWORD").ok();
                }
                if input.name.is_none() || input.email.is_none() || input.password.is_none() {
                    anyhow::bail!("--name, --email and a password are required");
                }
                let user = users.create(&input).await?;
                println!("Created staff account {}.", user.id);
                print_details(&user);
            }
            UsersSubcommand::Update(args) => {
                let user = users
                    .update(&UserId::new(args.id.as_str()), &args.fields.input())
                    .await?;
                println!("Updated staff account {}.", user.id);
                print_details(&user);
            }
            UsersSubcommand::Delete(args) => {
                let ack = users.delete(&UserId::new(args.id.as_str())).await?;
                println!("{}", ack.message);
            }
        }
        Ok(())
    }
}

fn summary(user: &StaffUser) -> String {
    format!(
        "{}  {}  {}  {}",
        user.id,
        user.name,
        or_none(user.email.as_deref()),
        or_none(user.role.as_deref())
    )
}

fn print_details(user: &StaffUser) {
    println!("Id: {}", user.id);
    println!("Name: {}", user.name);
    println!("Email: {}", or_none(user.email.as_deref()));
    println!("Role: {}", or_none(user.role.as_deref()));
    println!("Phone: {}", or_none(user.phone.as_deref()));
    match user.active {
        Some(active) => println!("Active: {active}"),
        None => println!("Active: <unknown>"),
    }
}
