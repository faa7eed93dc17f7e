//! Rehber - command-line client for the student-counseling dashboard API.
//!
//! Logs in against the API, keeps the session between runs, prints
//! dashboard statistics, and lists, adds and deletes student, meeting and
//! activity records.

mod commands;
mod format;

use std::io;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rehber_core::models::{ActivityInput, MeetingInput, StudentInput};
use rehber_core::Config;

#[derive(Parser)]
#[command(name = "rehber", version, about = "Student-counseling dashboard client")]
struct Cli {
    /// API base URL (overrides config and REHBER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session
    Login {
        /// Account email (defaults to REHBER_EMAIL or the last used email)
        #[arg(long)]
        email: Option<String>,
    },
    /// End the session, locally and on the server
    Logout,
    /// Show who is logged in according to the stored session
    Status,
    /// Re-fetch the logged-in user's profile from the server
    Whoami,
    /// Show dashboard statistics
    Stats,
    /// List recently added students
    Recent,
    /// List students
    Students {
        /// Only students in this class (e.g. 9-A)
        #[arg(long)]
        class: Option<String>,
    },
    /// Show one student
    Student { id: i64 },
    /// List meetings
    Meetings {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Only meetings about this student
        #[arg(long)]
        student: Option<i64>,
    },
    /// List activities
    Activities {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Add a student
    AddStudent {
        /// School number
        #[arg(long)]
        number: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Class, e.g. 9-A
        #[arg(long)]
        class: String,
        /// Gender code as used by the school (e.g. E or K)
        #[arg(long)]
        gender: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Record a counseling meeting
    AddMeeting {
        /// Person met with
        #[arg(long)]
        attendee: String,
        #[arg(long)]
        topic: String,
        /// Start time, HH:MM
        #[arg(long)]
        start: String,
        /// End time, HH:MM
        #[arg(long)]
        end: String,
        /// Meeting day, YYYY-MM-DD (server default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        student: Option<i64>,
        #[arg(long)]
        summary: Option<String>,
    },
    /// Record a guidance activity
    AddActivity {
        /// Activity day, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        method: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        target: String,
        #[arg(long = "type")]
        activity_type: String,
    },
    /// Delete a record
    Delete {
        #[arg(value_enum)]
        kind: RecordKind,
        id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RecordKind {
    Student,
    Meeting,
    Activity,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_env();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    info!(api_url = %config.api_base_url, "Rehber starting");

    let auth = config.auth_client()?;

    match cli.command {
        Command::Login { email } => commands::login(&auth, &mut config, email).await,
        Command::Logout => commands::logout(&auth).await,
        Command::Status => commands::status(&auth),
        Command::Whoami => commands::whoami(&auth).await,
        Command::Stats => commands::stats(&auth).await,
        Command::Recent => commands::recent(&auth).await,
        Command::Students { class } => commands::students(&auth, class.as_deref()).await,
        Command::Student { id } => commands::student(&auth, id).await,
        Command::Meetings { from, to, student } => {
            commands::meetings(&auth, from, to, student).await
        }
        Command::Activities { from, to } => commands::activities(&auth, from, to).await,
        Command::AddStudent {
            number,
            first_name,
            last_name,
            class,
            gender,
            phone,
            email,
        } => {
            let input = StudentInput {
                number,
                first_name,
                last_name,
                class_name: class,
                gender,
                phone,
                email,
            };
            commands::add_student(&auth, input).await
        }
        Command::AddMeeting {
            attendee,
            topic,
            start,
            end,
            date,
            student,
            summary,
        } => {
            let input = MeetingInput {
                student_id: student,
                date,
                start_time: Some(start),
                end_time: Some(end),
                attendee: Some(attendee),
                topic: Some(topic),
                summary,
                ..MeetingInput::default()
            };
            commands::add_meeting(&auth, input).await
        }
        Command::AddActivity {
            date,
            method,
            description,
            target,
            activity_type,
        } => {
            let input = ActivityInput::new(date, method, description, target, activity_type);
            commands::add_activity(&auth, input).await
        }
        Command::Delete { kind, id } => match kind {
            RecordKind::Student => commands::delete_student(&auth, id).await,
            RecordKind::Meeting => commands::delete_meeting(&auth, id).await,
            RecordKind::Activity => commands::delete_activity(&auth, id).await,
        },
    }
}
