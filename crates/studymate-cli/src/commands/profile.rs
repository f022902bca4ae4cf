use clap::Subcommand;
use studymate_core::Config;

use super::{open_companion, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the saved profile
    Show,
    /// Update name and age
    Set {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
    },
}

pub async fn run(action: ProfileAction) -> CmdResult {
    let mut app = open_companion(&Config::load()?).await?;
    match action {
        ProfileAction::Show => match app.profile() {
            Some(profile) => print_json(profile)?,
            None => println!("no profile yet"),
        },
        ProfileAction::Set { name, age } => {
            app.update_profile(&name, &age)?;
            println!("profile updated");
        }
    }
    Ok(())
}
