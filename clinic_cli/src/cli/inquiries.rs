use clap::{Args, Subcommand};
use clinic_core::{Inquiry, InquiryId, InquiryInput};

use crate::cli::common::{ListArgs, or_none, print_page, resolve, signed_in_client};

const USER_AGENT: &str = "clinic-cli-inquiries/0.1";

#[derive(Debug, Args)]
pub(crate) struct InquiriesCommand {
    #[command(subcommand)]
    subcmd: InquiriesSubcommand,
}

#[derive(Debug, Subcommand)]
enum InquiriesSubcommand {
    /// List one page of inquiries.
    List(ListArgs),

    /// Show one inquiry.
    Get(IdArgs),

    /// Record an inquiry taken by phone or at the desk.
    Create(CreateArgs),

    /// Move an inquiry to another status.
    Status(StatusArgs),

    /// Turn an inquiry into a patient record.
    Convert(IdArgs),

    /// Remove an inquiry.
    Delete(IdArgs),
}

#[derive(Debug, Args)]
struct IdArgs {
    id: String,
}

#[derive(Debug, Args)]
struct StatusArgs {
    id: String,
    status: String,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    message: Option<String>,
}

impl InquiriesCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        let client = signed_in_client(USER_AGENT)?;
        let inquiries = client.inquiries();

        match &self.subcmd {
            InquiriesSubcommand::List(args) => {
                let page = resolve(inquiries.list(&args.params())).await?;
                print_page(&page, summary);
            }
            InquiriesSubcommand::Get(args) => {
                let inquiry = resolve(inquiries.get(&InquiryId::new(args.id.as_str()))).await?;
                print_details(&inquiry);
            }
            InquiriesSubcommand::Create(args) => {
                let inquiry = inquiries
                    .create(&InquiryInput {
                        name: Some(args.name.clone()),
                        email: args.email.clone(),
                        phone: args.phone.clone(),
                        message: args.message.clone(),
                    })
                    .await?;
                println!("Recorded inquiry {}.", inquiry.id);
            }
            InquiriesSubcommand::Status(args) => {
                let inquiry = inquiries
                    .update_status(&InquiryId::new(args.id.as_str()), args.status.as_str())
                    .await?;
                println!(
                    "Inquiry {} is now {}.",
                    inquiry.id,
                    or_none(inquiry.status.as_deref())
                );
            }
            InquiriesSubcommand::Convert(args) => {
                let patient = inquiries.convert(&InquiryId::new(args.id.as_str())).await?;
                println!(
                    "Converted inquiry {} into patient {} ({}).",
                    args.id,
                    patient.id,
                    patient.full_name()
                );
            }
            InquiriesSubcommand::Delete(args) => {
                let ack = inquiries.delete(&InquiryId::new(args.id.as_str())).await?;
                println!("{}", ack.message);
            }
        }
        Ok(())
    }
}

fn summary(inquiry: &Inquiry) -> String {
    format!(
        "{}  {}  {}  {}",
        inquiry.id,
        inquiry.name,
        or_none(inquiry.phone.as_deref()),
        or_none(inquiry.status.as_deref())
    )
}

fn print_details(inquiry: &Inquiry) {
    println!("Id: {}", inquiry.id);
    println!("Name: {}", inquiry.name);
    println!("Email: {}", or_none(inquiry.email.as_deref()));
    println!("Phone: {}", or_none(inquiry.phone.as_deref()));
    println!("Status: {}", or_none(inquiry.status.as_deref()));
    match inquiry.created_at {
        Some(at) => println!("Received: {at}"),
        None => println!("Received: <unknown>"),
    }
    println!("Message: {}", or_none(inquiry.message.as_deref()));
}
