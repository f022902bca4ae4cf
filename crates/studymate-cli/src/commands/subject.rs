use std::path::PathBuf;

use clap::Subcommand;
use studymate_core::subject::{ingest_path, open_external};
use studymate_core::Config;

use super::{open_companion, print_json, resolve_subject, CmdResult};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// List subjects
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a subject
    Create {
        name: String,
        #[arg(long, default_value = "")]
        emoji: String,
    },
    /// Delete a subject
    Remove { subject: String },
    /// Print a subject as JSON
    Show { subject: String },
    /// Append a note
    AddNote { subject: String, text: String },
    /// Delete the note at INDEX (1-based)
    RemoveNote { subject: String, index: usize },
    /// Attach images by URI
    AddImage {
        subject: String,
        #[arg(required = true)]
        uris: Vec<String>,
    },
    /// Delete the image at INDEX (1-based)
    RemoveImage { subject: String, index: usize },
    /// Attach files from disk
    AddFile {
        subject: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete the file at INDEX (1-based)
    RemoveFile { subject: String, index: usize },
    /// Print a text file, or open a document with the system viewer
    OpenFile { subject: String, index: usize },
    /// Add a content section
    AddSection { subject: String, name: String },
    /// Rename the content section at INDEX (1-based)
    RenameSection {
        subject: String,
        index: usize,
        name: String,
    },
}

fn zero_based(index: usize) -> Result<usize, Box<dyn std::error::Error>> {
    index
        .checked_sub(1)
        .ok_or_else(|| "indexes start at 1".into())
}

pub async fn run(action: SubjectAction) -> CmdResult {
    let mut app = open_companion(&Config::load()?).await?;

    match action {
        SubjectAction::List { json } => {
            if json {
                return print_json(app.subjects());
            }
            if app.subjects().is_empty() {
                println!("no subjects yet");
            }
            for (i, s) in app.subjects().iter().enumerate() {
                let synced = if s.remote_id.is_some() { " ☁" } else { "" };
                println!(
                    "{:>2}. {} {}{}  [{}]  notes:{} images:{} files:{}",
                    i + 1,
                    s.emoji,
                    s.name,
                    synced,
                    &s.id.as_str()[..8.min(s.id.as_str().len())],
                    s.notes.len(),
                    s.images.len(),
                    s.files.len()
                );
            }
        }
        SubjectAction::Create { name, emoji } => {
            let id = app.create_subject(&name, &emoji).await?;
            println!("{id}");
        }
        SubjectAction::Remove { subject } => {
            let id = resolve_subject(&app, &subject)?;
            let removed = app.remove_subject(&id).await?;
            println!("removed {}", removed.name);
        }
        SubjectAction::Show { subject } => {
            let id = resolve_subject(&app, &subject)?;
            print_json(app.subject(&id)?)?;
        }
        SubjectAction::AddNote { subject, text } => {
            let id = resolve_subject(&app, &subject)?;
            app.add_note(&id, &text).await?;
            println!("note added");
        }
        SubjectAction::RemoveNote { subject, index } => {
            let id = resolve_subject(&app, &subject)?;
            app.remove_note(&id, zero_based(index)?)?;
            println!("note removed");
        }
        SubjectAction::AddImage { subject, uris } => {
            let id = resolve_subject(&app, &subject)?;
            let count = uris.len();
            app.add_images(&id, uris)?;
            println!("{count} image(s) added");
        }
        SubjectAction::RemoveImage { subject, index } => {
            let id = resolve_subject(&app, &subject)?;
            app.remove_image(&id, zero_based(index)?)?;
            println!("image removed");
        }
        SubjectAction::AddFile { subject, paths } => {
            let id = resolve_subject(&app, &subject)?;
            let files: Vec<_> = paths.iter().map(|p| ingest_path(p)).collect();
            for f in &files {
                let kind = if f.externally_openable { "document" } else { "text" };
                println!("{} ({kind})", f.name);
            }
            app.add_files(&id, files)?;
        }
        SubjectAction::RemoveFile { subject, index } => {
            let id = resolve_subject(&app, &subject)?;
            let file = app.remove_file(&id, zero_based(index)?)?;
            println!("removed {}", file.name);
        }
        SubjectAction::OpenFile { subject, index } => {
            let id = resolve_subject(&app, &subject)?;
            let index = zero_based(index)?;
            let file = app
                .subject(&id)?
                .files
                .get(index)
                .ok_or_else(|| format!("no file at position {}", index + 1))?;
            if file.externally_openable {
                open_external(file)?;
            } else {
                println!("{}", file.content);
            }
        }
        SubjectAction::AddSection { subject, name } => {
            let id = resolve_subject(&app, &subject)?;
            app.add_section(&id, &name)?;
            println!("section added");
        }
        SubjectAction::RenameSection {
            subject,
            index,
            name,
        } => {
            let id = resolve_subject(&app, &subject)?;
            app.rename_section(&id, zero_based(index)?, &name)?;
            println!("section renamed");
        }
    }
    Ok(())
}
