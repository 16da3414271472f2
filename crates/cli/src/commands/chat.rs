//! `doppel chat` — talk to the agent from the terminal.

use std::io::{BufRead, Write};

use doppel_config::AppConfig;
use doppel_core::Session;

use crate::bootstrap;

pub async fn run(message: Option<String>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let runtime = bootstrap::build(config)?;
    let mut session = Session::new();

    if let Some(message) = message {
        let outcome = runtime.agent.run_turn(&mut session, &message).await?;
        println!("{}", outcome.text());
        return Ok(());
    }

    println!("Chatting with {}. Type 'exit' to quit.", runtime.config.owner.name);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match runtime.agent.run_turn(&mut session, line).await {
            Ok(outcome) => println!("{}", outcome.text()),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
