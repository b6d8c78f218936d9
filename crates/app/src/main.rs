use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flash_core::model::Level;
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod practice;

use config::{AppConfig, prepare_sqlite_file};

#[derive(Parser)]
#[command(name = "flashmath", version, about = "Flash mental-arithmetic practice")]
struct Cli {
    /// Database location (sqlite url or file path); overrides FLASHMATH_DB_URL
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a question table, replacing the level's groups
    Import {
        file: PathBuf,

        /// Level of the table; guessed from the file name when omitted
        #[arg(long)]
        level: Option<Level>,

        /// Teacher email recorded with the upload
        #[arg(long, default_value = "teacher@localhost")]
        uploaded_by: String,
    },

    /// Write a level's groups as a question table
    Export {
        #[arg(long)]
        level: Level,

        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List a level's groups
    Groups {
        #[arg(long)]
        level: Level,
    },

    /// List uploaded tables, or remove one record
    Files {
        #[command(subcommand)]
        command: Option<FileCommands>,
    },

    /// Manage the student roster
    Students {
        #[command(subcommand)]
        command: StudentCommands,
    },

    /// Show per-group results for a student
    Progress { student_id: u64 },

    /// Practice one group in the terminal
    Practice {
        #[arg(long)]
        name: String,

        #[arg(long)]
        classroom: Level,

        #[arg(long)]
        group: String,
    },
}

#[derive(Subcommand)]
enum StudentCommands {
    List,

    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        age: Option<u8>,

        #[arg(long)]
        classroom: Level,

        /// Milliseconds each number stays on screen
        #[arg(long)]
        flash_speed: Option<u32>,

        /// Seconds allowed for an answer
        #[arg(long)]
        response_time: Option<u32>,
    },

    /// Change a student's details; omitted fields stay as they are
    Update {
        id: u64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        age: Option<u8>,

        #[arg(long)]
        classroom: Option<Level>,

        /// Milliseconds each number stays on screen
        #[arg(long)]
        flash_speed: Option<u32>,

        /// Seconds allowed for an answer
        #[arg(long)]
        response_time: Option<u32>,
    },

    Remove { id: u64 },
}

#[derive(Subcommand)]
enum FileCommands {
    /// Forget an upload record; its groups stay imported
    Remove { id: u64 },
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    prepare_sqlite_file(&config.db_url)?;
    let services = AppServices::new_sqlite(&config.db_url, Clock::system()).await?;

    match cli.command {
        Commands::Import {
            file,
            level,
            uploaded_by,
        } => commands::import(&services, &file, level, &uploaded_by).await,
        Commands::Export { level, out } => commands::export(&services, level, out.as_deref()).await,
        Commands::Groups { level } => commands::groups(&services, level).await,
        Commands::Files { command } => match command {
            None => commands::files(&services).await,
            Some(FileCommands::Remove { id }) => commands::remove_file(&services, id).await,
        },
        Commands::Students { command } => match command {
            StudentCommands::List => commands::list_students(&services).await,
            StudentCommands::Add {
                name,
                age,
                classroom,
                flash_speed,
                response_time,
            } => {
                commands::add_student(&services, name, age, classroom, flash_speed, response_time)
                    .await
            }
            StudentCommands::Update {
                id,
                name,
                age,
                classroom,
                flash_speed,
                response_time,
            } => {
                let changes = commands::StudentChanges {
                    name,
                    age,
                    classroom,
                    flash_speed,
                    response_time,
                };
                commands::update_student(&services, id, changes).await
            }
            StudentCommands::Remove { id } => commands::remove_student(&services, id).await,
        },
        Commands::Progress { student_id } => commands::progress(&services, student_id).await,
        Commands::Practice {
            name,
            classroom,
            group,
        } => practice::run(&services, &name, classroom, &group).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match AppConfig::from_env().with_db_override(cli.db.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli, config).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
