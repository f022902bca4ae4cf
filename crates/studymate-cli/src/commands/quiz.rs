use studymate_core::{Config, GeminiClient, QuizConfig, QuizGenerator};

use super::{open_companion, resolve_subject, CmdResult};

pub async fn run(subject: &str) -> CmdResult {
    let cfg = Config::load()?;
    let client = GeminiClient::from_config(&cfg.ai)
        .ok_or("no API key; set GEMINI_API_KEY or ai.api_key")?;
    let generator = QuizGenerator::new(client, QuizConfig::from(&cfg.ai));

    let app = open_companion(&cfg).await?;
    let id = resolve_subject(&app, subject)?;
    eprintln!("generating questions for {}...", app.subject(&id)?.name);
    println!("{}", app.quiz(&id, &generator).await?);
    Ok(())
}
