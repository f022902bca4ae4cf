use clap::Subcommand;
use studymate_core::Config;

use super::{open_companion, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and save the profile
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
    },
    /// Sign in and load your subjects
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and erase local data
    Logout,
    /// Show who is signed in
    Status,
}

pub async fn run(action: AuthAction) -> CmdResult {
    let config = Config::load()?;
    let mut app = open_companion(&config).await?;

    match action {
        AuthAction::Register {
            email,
            password,
            name,
            age,
        } => {
            app.register(&email, &password, &name, &age).await?;
            println!("Account created. Sign in with `studymate auth login`.");
        }
        AuthAction::Login { email, password } => {
            let user = app.login(&email, &password).await?;
            println!(
                "Signed in as {} ({} subjects)",
                user.email.as_deref().unwrap_or(&user.id),
                app.subjects().len()
            );
        }
        AuthAction::Logout => {
            app.logout().await?;
            println!("Signed out. Local data cleared.");
        }
        AuthAction::Status => match app.user() {
            Some(user) => println!("signed in: {}", user.email.as_deref().unwrap_or(&user.id)),
            None if config.remote.is_configured() => println!("signed out"),
            None => println!("signed out (no remote configured; subjects stay local)"),
        },
    }
    Ok(())
}
