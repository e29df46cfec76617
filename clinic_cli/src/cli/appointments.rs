use clap::{Args, Subcommand};
use clinic_core::{
    Appointment, AppointmentId, AppointmentInput, PatientId, ServiceId, Timestamp, UserId,
};

use crate::cli::common::{ListArgs, or_none, parse_timestamp, print_page, resolve, signed_in_client};

const USER_AGENT: &str = "clinic-cli-appointments/0.1";

#[derive(Debug, Args)]
pub(crate) struct AppointmentsCommand {
    #[command(subcommand)]
    subcmd: AppointmentsSubcommand,
}

#[derive(Debug, Subcommand)]
enum AppointmentsSubcommand {
    /// List one page of appointments. Use `--filter patientId=...` to narrow.
    List(ListArgs),

    /// Show one appointment.
    Get(IdArgs),

    /// Book an appointment.
    Create(AppointmentArgs),

    /// Reschedule or edit an appointment.
    Update(UpdateArgs),

    /// Move an appointment to another status.
    Status(StatusArgs),

    /// Cancel and remove an appointment.
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
    fields: AppointmentArgs,
}

#[derive(Debug, Args)]
struct StatusArgs {
    id: String,
    status: String,
}

#[derive(Debug, Args)]
struct AppointmentArgs {
    #[arg(long)]
    patient_id: Option<String>,

    #[arg(long)]
    doctor_id: Option<String>,

    #[arg(long)]
    service_id: Option<String>,

    /// RFC 3339, e.g. `2026-03-01T09:30:00Z`.
    #[arg(long, value_parser = parse_timestamp)]
    scheduled_at: Option<Timestamp>,

    #[arg(long)]
    notes: Option<String>,
}

impl AppointmentArgs {
    fn input(&self) -> AppointmentInput {
        AppointmentInput {
            patient_id: self.patient_id.as_deref().map(PatientId::new),
            doctor_id: self.doctor_id.as_deref().map(UserId::new),
            service_id: self.service_id.as_deref().map(ServiceId::new),
            scheduled_at: self.scheduled_at,
            status: None,
            notes: self.notes.clone(),
        }
    }
}

impl AppointmentsCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        let client = signed_in_client(USER_AGENT)?;
        let appointments = client.appointments();

        match &self.subcmd {
            AppointmentsSubcommand::List(args) => {
                let page = resolve(appointments.list(&args.params())).await?;
                print_page(&page, summary);
            }
            AppointmentsSubcommand::Get(args) => {
                let appointment =
                    resolve(appointments.get(&AppointmentId::new(args.id.as_str()))).await?;
                print_details(&appointment);
            }
            AppointmentsSubcommand::Create(args) => {
                if args.patient_id.is_none() || args.scheduled_at.is_none() {
                    anyhow::bail!("--patient-id and --scheduled-at are required");
                }
                let appointment = appointments.create(&args.input()).await?;
                println!("Booked appointment {}.", appointment.id);
                print_details(&appointment);
            }
            AppointmentsSubcommand::Update(args) => {
                let appointment = appointments
                    .update(&AppointmentId::new(args.id.as_str()), &args.fields.input())
                    .await?;
                println!("Updated appointment {}.", appointment.id);
                print_details(&appointment);
            }
            AppointmentsSubcommand::Status(args) => {
                let appointment = appointments
                    .update_status(&AppointmentId::new(args.id.as_str()), args.status.as_str())
                    .await?;
                println!(
                    "Appointment {} is now {}.",
                    appointment.id,
                    or_none(appointment.status.as_deref())
                );
            }
            AppointmentsSubcommand::Delete(args) => {
                let ack = appointments
                    .delete(&AppointmentId::new(args.id.as_str()))
                    .await?;
                println!("{}", ack.message);
            }
        }
        Ok(())
    }
}

fn summary(appointment: &Appointment) -> String {
    format!(
        "{}  {}  {}  {}",
        appointment.id,
        appointment
            .scheduled_at
            .map(|at| at.to_string())
            .unwrap_or_else(|| "<unscheduled>".to_owned()),
        or_none(appointment.patient_name.as_deref()),
        or_none(appointment.status.as_deref())
    )
}

fn print_details(appointment: &Appointment) {
    println!("Id: {}", appointment.id);
    println!(
        "Patient: {} ({})",
        or_none(appointment.patient_name.as_deref()),
        or_none(appointment.patient_id.as_ref().map(PatientId::as_str))
    );
    println!(
        "Doctor: {}",
        or_none(appointment.doctor_id.as_ref().map(UserId::as_str))
    );
    println!(
        "Service: {}",
        or_none(appointment.service_id.as_ref().map(ServiceId::as_str))
    );
    match appointment.scheduled_at {
        Some(at) => println!("Scheduled: {at}"),
        None => println!("Scheduled: <unscheduled>"),
    }
    println!("Status: {}", or_none(appointment.status.as_deref()));
    println!("Notes: {}", or_none(appointment.notes.as_deref()));
}
