use std::path::PathBuf;

use anyhow::{Context, Result};
use checklist_core::model::{StepIndex, Student};
use clap::{Parser, Subcommand, ValueEnum};
use services::{AppServices, Clock, ImportMode, StudentFilter, StudentService, StudentServiceError};

mod config;
mod render;
mod seed;
mod telemetry;

#[derive(Parser)]
#[command(name = "regcheck")]
#[command(about = "Staff-verified registration checklist for incoming students", long_about = None)]
struct Cli {
    /// SQLite database URL or file path
    #[arg(long, global = true, env = "REGCHECK_DB_URL", default_value = config::DEFAULT_DB_URL)]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the checklist steps and where each one happens
    Steps,
    /// Add a student with every step pending
    Add {
        name: String,
        #[arg(long)]
        grade: Option<String>,
    },
    /// List students, optionally narrowed by a search and progress filter
    List {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },
    /// Show one student's checklist
    Show { id: String },
    /// Sign off a step for a student
    Sign {
        id: String,
        step: u8,
        #[arg(long)]
        initials: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        pin: String,
    },
    /// Return every step of a student to pending
    Reset {
        id: String,
        #[arg(long)]
        pin: String,
    },
    /// Remove a student
    Delete {
        id: String,
        #[arg(long)]
        pin: String,
    },
    /// Print a certificate, or a progress report for unfinished students
    Certificate { id: String },
    /// Write the roster as JSON to a file or stdout
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load a roster previously written by `export`
    Import {
        file: PathBuf,
        /// Keep current students and overwrite only matching ids
        #[arg(long)]
        merge: bool,
        #[arg(long)]
        pin: String,
    },
    /// Change the staff PIN
    SetPin {
        #[arg(long)]
        pin: String,
        #[arg(long)]
        new_pin: String,
    },
    /// Add demo students at varied stages of progress
    Seed {
        #[arg(long, default_value_t = 8)]
        count: usize,
        #[arg(long)]
        pin: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterArg {
    All,
    NotStarted,
    InProgress,
    Completed,
}

impl From<FilterArg> for StudentFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => StudentFilter::All,
            FilterArg::NotStarted => StudentFilter::NotStarted,
            FilterArg::InProgress => StudentFilter::InProgress,
            FilterArg::Completed => StudentFilter::Completed,
        }
    }
}

fn find<'a>(students: &'a StudentService, raw: &str) -> Result<&'a Student> {
    let id = students.resolve(raw)?;
    Ok(students
        .get(id)
        .ok_or(StudentServiceError::NotFound(id))?)
}

async fn run() -> Result<()> {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    telemetry::init_telemetry()?;

    if let Commands::Steps = cli.command {
        print!("{}", render::catalog());
        return Ok(());
    }

    let db_url = config::normalize_sqlite_url(&cli.db);
    config::prepare_sqlite_file(&db_url)?;
    let mut app = AppServices::new_sqlite(&db_url, Clock::system())
        .await
        .with_context(|| format!("failed to open {db_url}"))?;

    match cli.command {
        Commands::Steps => {}
        Commands::Add { name, grade } => {
            let id = app
                .students_mut()
                .create_student(&name, grade.as_deref())
                .await?;
            let student = find(app.students(), &id.to_string())?;
            println!("Added {} ({})", student.name(), id.short());
        }
        Commands::List { query, filter } => {
            let students = app.students().search(&query, filter.into());
            if students.is_empty() {
                println!("No students match.");
            }
            for student in students {
                println!("{}", render::roster_line(student));
            }
            println!("{}", render::summary(&app.students().summary()));
        }
        Commands::Show { id } => {
            print!("{}", render::student_detail(find(app.students(), &id)?));
        }
        Commands::Sign {
            id,
            step,
            initials,
            note,
            pin,
        } => {
            let staff = app.staff().unlock(&pin).await?;
            let id = app.students().resolve(&id)?;
            let index = StepIndex::new(step)?;
            let student = app
                .students_mut()
                .sign_step(&staff, id, index, &initials, note.as_deref())
                .await?;
            println!(
                "Signed step {index} ({}) for {}. {}% complete.",
                index.entry().title,
                student.name(),
                student.percent_complete()
            );
        }
        Commands::Reset { id, pin } => {
            let staff = app.staff().unlock(&pin).await?;
            let id = app.students().resolve(&id)?;
            let student = app.students_mut().reset_student(&staff, id).await?;
            println!("Reset {} to step 1.", student.name());
        }
        Commands::Delete { id, pin } => {
            let staff = app.staff().unlock(&pin).await?;
            let id = app.students().resolve(&id)?;
            let removed = app.students_mut().delete_student(&staff, id).await?;
            println!("Deleted {} ({}).", removed.name(), id.short());
        }
        Commands::Certificate { id } => {
            let id = app.students().resolve(&id)?;
            print!("{}", render::certificate(&app.students().certificate(id)?));
        }
        Commands::Export { out } => {
            let json = app.students().export_json()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!(
                        "Exported {} students to {}.",
                        app.students().list().len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
        Commands::Import { file, merge, pin } => {
            let staff = app.staff().unlock(&pin).await?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mode = if merge {
                ImportMode::Merge
            } else {
                ImportMode::Replace
            };
            let report = app.students_mut().import_json(&staff, &raw, mode).await?;
            println!(
                "Imported {} new and {} replaced students, {} in total.",
                report.added, report.replaced, report.total
            );
        }
        Commands::SetPin { pin, new_pin } => {
            let staff = app.staff().unlock(&pin).await?;
            app.staff().change_pin(&staff, &new_pin).await?;
            println!("Staff PIN updated.");
        }
        Commands::Seed { count, pin } => {
            let staff = app.staff().unlock(&pin).await?;
            let added = seed::seed_roster(&mut app, &staff, count).await?;
            println!("Seeded {added} demo students.");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
