//! digiclass CLI: grading and attempt tracking from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use digiclass_core::error::ServiceError;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "digiclass", version, about = "Assignment grading and attempt tracking")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example assignment
    Init,

    /// Validate assignment TOML files
    Validate {
        /// Path to assignment file or directory
        #[arg(long)]
        assignment: PathBuf,
    },

    /// Grade answers against an assignment file without recording anything
    Grade {
        /// Assignment TOML file
        #[arg(long)]
        assignment: PathBuf,

        /// Answers JSON file
        #[arg(long)]
        answers: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store assignment files so learners can submit against them
    Publish {
        /// Path to assignment file or directory
        #[arg(long)]
        assignment: PathBuf,

        /// Acting teacher id
        #[arg(long, default_value = "1")]
        teacher: u64,

        /// Store as a draft that learners cannot submit yet
        #[arg(long)]
        draft: bool,
    },

    /// Submit a learner's answers
    Submit {
        #[arg(long)]
        assignment_id: u64,

        /// Submitting learner id
        #[arg(long)]
        learner: u64,

        /// Answers JSON file
        #[arg(long)]
        answers: PathBuf,

        /// Print the receipt as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear a learner's attempts on an assignment
    Reset {
        #[arg(long)]
        assignment_id: u64,

        #[arg(long)]
        learner: u64,

        /// Acting teacher id
        #[arg(long, default_value = "1")]
        teacher: u64,
    },

    /// List stored assignments
    Assignments {
        /// Show the listing as this learner sees it
        #[arg(long)]
        learner: Option<u64>,

        #[arg(long)]
        class_id: Option<u64>,

        #[arg(long)]
        subject: Option<String>,

        /// Acting teacher id, used when no learner is given
        #[arg(long, default_value = "1")]
        teacher: u64,
    },

    /// Show a learner's grade history
    History {
        #[arg(long)]
        learner: u64,

        /// Only this subject
        #[arg(long)]
        subject: Option<String>,
    },

    /// List submissions for an assignment, newest first
    Submissions {
        #[arg(long)]
        assignment_id: u64,

        #[arg(long, default_value = "1")]
        page: usize,

        /// Defaults to the configured page size
        #[arg(long)]
        page_size: Option<usize>,

        /// Acting teacher id
        #[arg(long, default_value = "1")]
        teacher: u64,
    },

    /// Per-learner averages for a class or subject
    Summary {
        #[arg(long)]
        class_id: Option<u64>,

        #[arg(long)]
        subject: Option<String>,

        /// Acting teacher id
        #[arg(long, default_value = "1")]
        teacher: u64,
    },

    /// Delete an assignment and its submissions
    Delete {
        #[arg(long)]
        assignment_id: u64,

        /// Acting teacher id
        #[arg(long, default_value = "1")]
        teacher: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("digiclass=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { assignment } => commands::validate::execute(assignment),
        Commands::Grade {
            assignment,
            answers,
            json,
        } => commands::grade::execute(assignment, answers, json),
        Commands::Publish {
            assignment,
            teacher,
            draft,
        } => commands::publish::execute(config, assignment, teacher, draft).await,
        Commands::Submit {
            assignment_id,
            learner,
            answers,
            json,
        } => commands::submit::execute(config, assignment_id, learner, answers, json).await,
        Commands::Reset {
            assignment_id,
            learner,
            teacher,
        } => commands::reset::execute(config, assignment_id, learner, teacher).await,
        Commands::Assignments {
            learner,
            class_id,
            subject,
            teacher,
        } => commands::assignments::execute(config, learner, class_id, subject, teacher).await,
        Commands::History { learner, subject } => {
            commands::history::execute(config, learner, subject).await
        }
        Commands::Submissions {
            assignment_id,
            page,
            page_size,
            teacher,
        } => commands::submissions::execute(config, assignment_id, page, page_size, teacher).await,
        Commands::Summary {
            class_id,
            subject,
            teacher,
        } => commands::summary::execute(config, class_id, subject, teacher).await,
        Commands::Delete {
            assignment_id,
            teacher,
        } => commands::delete::execute(config, assignment_id, teacher).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        // Storage failures exit 2 so scripts can tell them from rejected requests.
        let backend_failure = e
            .downcast_ref::<ServiceError>()
            .is_some_and(|se| !se.is_client_error());
        process::exit(if backend_failure { 2 } else { 1 });
    }
}
