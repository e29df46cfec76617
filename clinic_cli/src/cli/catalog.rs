use clap::{Args, Subcommand};
use clinic_core::{Service, ServiceId, ServiceInput};

use crate::cli::common::{ListArgs, or_none, print_page, resolve, signed_in_client};

const USER_AGENT: &str = "clinic-cli-catalog/0.1";

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    subcmd: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List one page of services.
    Services(ListArgs),

    /// List appointment statuses.
    Statuses,

    /// Add a service.
    CreateService(ServiceArgs),

    /// Change a service.
    UpdateService(UpdateServiceArgs),

    /// Remove a service.
    DeleteService(IdArgs),
}

#[derive(Debug, Args)]
struct IdArgs {
    id: String,
}

#[derive(Debug, Args)]
struct UpdateServiceArgs {
    id: String,

    #[command(flatten)]
    fields: ServiceArgs,
}

#[derive(Debug, Args)]
struct ServiceArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    price: Option<f64>,

    #[arg(long)]
    duration_minutes: Option<u32>,
}

impl ServiceArgs {
    fn input(&self) -> ServiceInput {
        ServiceInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            duration_minutes: self.duration_minutes,
        }
    }
}

impl CatalogCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        let client = signed_in_client(USER_AGENT)?;
        let catalog = client.catalog();

        match &self.subcmd {
            CatalogSubcommand::Services(args) => {
                let page = resolve(catalog.services(&args.params())).await?;
                print_page(&page, summary);
            }
            CatalogSubcommand::Statuses => {
                let statuses = resolve(catalog.statuses()).await?;
                for status in statuses.iter() {
                    println!(
                        "{}  {}  {}",
                        status.id,
                        status.name,
                        or_none(status.color.as_deref())
                    );
                }
            }
            CatalogSubcommand::CreateService(args) => {
                if args.name.is_none() {
                    anyhow::bail!("--name is required");
                }
                let service = catalog.create_service(&args.input()).await?;
                println!("Created service {}.", summary(&service));
            }
            CatalogSubcommand::UpdateService(args) => {
                let service = catalog
                    .update_service(&ServiceId::new(args.id.as_str()), &args.fields.input())
                    .await?;
                println!("Updated service {}.", summary(&service));
            }
            CatalogSubcommand::DeleteService(args) => {
                let ack = catalog
                    .delete_service(&ServiceId::new(args.id.as_str()))
                    .await?;
                println!("{}", ack.message);
            }
        }
        Ok(())
    }
}

fn summary(service: &Service) -> String {
    let price = service
        .price
        .map(|price| format!("{price:.2}"))
        .unwrap_or_else(|| "<no price>".to_owned());
    let duration = service
        .duration_minutes
        .map(|minutes| format!("{minutes} min"))
        .unwrap_or_else(|| "<no duration>".to_owned());
    format!("{}  {}  {price}  {duration}", service.id, service.name)
}
