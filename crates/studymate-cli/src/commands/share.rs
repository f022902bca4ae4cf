use std::io::Read;

use clap::Subcommand;
use studymate_core::{Config, ImportChoice, ImportOutcome};

use super::{open_companion, resolve_subject, CmdResult};

#[derive(Subcommand)]
pub enum ShareAction {
    /// Print the share payload for a subject
    Export { subject: String },
    /// Import a payload. Reads stdin when PAYLOAD is omitted or "-"
    Import {
        payload: Option<String>,
        /// Replace a subject with the same name
        #[arg(long, conflicts_with = "discard")]
        overwrite: bool,
        /// Keep the existing subject and drop the import
        #[arg(long)]
        discard: bool,
    },
}

pub async fn run(action: ShareAction) -> CmdResult {
    let mut app = open_companion(&Config::load()?).await?;

    match action {
        ShareAction::Export { subject } => {
            let id = resolve_subject(&app, &subject)?;
            println!("{}", app.export(&id)?);
        }
        ShareAction::Import {
            payload,
            overwrite,
            discard,
        } => {
            let payload = match payload.as_deref() {
                None | Some("-") => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
                Some(p) => p.to_string(),
            };
            match app.import(&payload)? {
                ImportOutcome::Added(id) => println!("imported {id}"),
                ImportOutcome::Conflict(pending) => {
                    let choice = match (overwrite, discard) {
                        (true, _) => ImportChoice::Overwrite,
                        (_, true) => ImportChoice::Discard,
                        _ => {
                            return Err(format!(
                                "a subject named \"{}\" already exists; re-run with --overwrite or --discard",
                                pending.name()
                            )
                            .into())
                        }
                    };
                    match app.resolve_import(pending, choice)? {
                        Some(id) => println!("replaced with {id}"),
                        None => println!("import discarded"),
                    }
                }
            }
        }
    }
    Ok(())
}
