use std::{path::PathBuf, sync::Arc};

use colored::Colorize;
use contextbot::{
    Chatbot, ContextService, LlmClient, MessageMapper,
    chat::client::CompletionAgent,
    config::ChatBotConfig,
    utils::log::Logger,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Logger::init(None);

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let config = ChatBotConfig::read(path)?;

    let llm: Arc<dyn LlmClient> = Arc::new(CompletionAgent::new(config.llm.clone())?);

    let services = config
        .services
        .iter()
        .map(|service| service.build(&llm, &config.llm))
        .collect::<Result<Vec<Box<dyn ContextService>>, _>>()?;

    log::info!(
        "starting with {} context service(s) on {} ({})",
        services.len(),
        config.llm.model,
        config.llm.provider
    );

    let mut chatbot = Chatbot::with_templates(
        llm,
        services,
        config.chatbot.restrictions.clone(),
        config.chatbot.personality.clone(),
        None,
        MessageMapper,
        config.chatbot.templates.clone(),
    )?
    .turn_policy(config.chatbot.turn_policy);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("{} ", "you>".bold().green());

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        match question {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                println!("{}", serde_json::to_string_pretty(&chatbot.pairs())?);
                continue;
            }
            _ => {}
        }

        match chatbot.chat(question).await {
            Ok(answer) => println!("{} {}", "bot>".bold().cyan(), answer),
            Err(why) => log::error!("turn failed: {why:?}"),
        }
    }

    Ok(())
}
