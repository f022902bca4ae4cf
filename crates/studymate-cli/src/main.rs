use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studymate", version, about = "Studymate study companion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account registration and sign-in
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Local user profile
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Daily-use streak
    Streak,
    /// Subject management
    Subject {
        #[command(subcommand)]
        action: commands::subject::SubjectAction,
    },
    /// Share subjects as copyable payloads
    Share {
        #[command(subcommand)]
        action: commands::share::ShareAction,
    },
    /// Study timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Ambient music
    Music {
        #[command(subcommand)]
        action: commands::music::MusicAction,
    },
    /// Generate a quiz from a subject
    Quiz {
        /// Subject id, id prefix or list position
        subject: String,
    },
    /// Task calendar
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STUDYMATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action).await,
        Commands::Profile { action } => commands::profile::run(action).await,
        Commands::Streak => commands::streak::run().await,
        Commands::Subject { action } => commands::subject::run(action).await,
        Commands::Share { action } => commands::share::run(action).await,
        Commands::Timer { action } => commands::timer::run(action).await,
        Commands::Music { action } => commands::music::run(action).await,
        Commands::Quiz { subject } => commands::quiz::run(&subject).await,
        Commands::Calendar { action } => commands::calendar::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "studymate", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
