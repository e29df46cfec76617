use clap::{Args, Subcommand};
use clinic_core::{Patient, PatientId, PatientInput};

use crate::cli::common::{ListArgs, or_none, print_page, resolve, signed_in_client};

const USER_AGENT: &str = "clinic-cli-patients/0.1";

#[derive(Debug, Args)]
pub(crate) struct PatientsCommand {
    #[command(subcommand)]
    subcmd: PatientsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PatientsSubcommand {
    /// List one page of patients.
    List(ListArgs),

    /// Show one patient.
    Get(IdArgs),

    /// Register a new patient.
    Create(PatientArgs),

    /// Change fields of an existing patient.
    Update(UpdateArgs),

    /// Remove a patient.
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
    fields: PatientArgs,
}

#[derive(Debug, Args)]
struct PatientArgs {
    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    /// `YYYY-MM-DD`.
    #[arg(long)]
    date_of_birth: Option<String>,

    #[arg(long)]
    gender: Option<String>,

    #[arg(long)]
    address: Option<String>,
}

impl PatientArgs {
    fn input(&self) -> PatientInput {
        PatientInput {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            date_of_birth: self.date_of_birth.clone(),
            gender: self.gender.clone(),
            address: self.address.clone(),
        }
    }
}

impl PatientsCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        let client = signed_in_client(USER_AGENT)?;
        let patients = client.patients();

        match &self.subcmd {
            PatientsSubcommand::List(args) => {
                let page = resolve(patients.list(&args.params())).await?;
                print_page(&page, summary);
            }
            PatientsSubcommand::Get(args) => {
                let patient = resolve(patients.get(&PatientId::new(args.id.as_str()))).await?;
                print_details(&patient);
            }
            PatientsSubcommand::Create(args) => {
                if args.first_name.is_none() || args.last_name.is_none() {
                    anyhow::bail!("--first-name and --last-name are required");
                }
                let patient = patients.create(&args.input()).await?;
                println!("Created patient {}.", patient.id);
                print_details(&patient);
            }
            PatientsSubcommand::Update(args) => {
                let patient = patients
                    .update(&PatientId::new(args.id.as_str()), &args.fields.input())
                    .await?;
                println!("Updated patient {}.", patient.id);
                print_details(&patient);
            }
            PatientsSubcommand::Delete(args) => {
                let ack = patients.delete(&PatientId::new(args.id.as_str())).await?;
                println!("{}", ack.message);
            }
        }
        Ok(())
    }
}

fn summary(patient: &Patient) -> String {
    format!(
        "{}  {}  {}",
        patient.id,
        patient.full_name(),
        or_none(patient.phone.as_deref())
    )
}

fn print_details(patient: &Patient) {
    println!("Id: {}", patient.id);
    println!("Name: {}", patient.full_name());
    println!("Email: {}", or_none(patient.email.as_deref()));
    println!("Phone: {}", or_none(patient.phone.as_deref()));
    println!("Born: {}", or_none(patient.date_of_birth.as_deref()));
    println!("Gender: {}", or_none(patient.gender.as_deref()));
    println!("Address: {}", or_none(patient.address.as_deref()));
}
