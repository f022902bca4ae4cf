use studymate_core::Config;

use super::{open_companion, CmdResult};

pub async fn run() -> CmdResult {
    let app = open_companion(&Config::load()?).await?;
    let days = app.streak().map(|s| s.days).unwrap_or(1);
    let unit = if days == 1 { "day" } else { "days" };
    println!("🔥 {days} {unit} in a row");
    Ok(())
}
