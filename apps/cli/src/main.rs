use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use client_core::{config, CheckerSession, ServiceEndpoint};

#[derive(Parser, Debug)]
#[command(name = "checker", about = "Interactive symptom checker client")]
struct Args {
    /// Prediction service base url. Falls back to checker.toml / environment
    /// overrides, then the local development endpoint.
    #[arg(long)]
    server_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut config = config::load_settings();
    if let Some(raw) = args.server_url {
        config.endpoint = ServiceEndpoint::from_url(&raw)?;
    }
    let debounce = config.debounce;

    let session = CheckerSession::new(config);
    println!("symptom checker — endpoint {}", session.base_url());

    match session.load_vocabulary().await {
        Ok(count) => println!("loaded {count} symptoms"),
        Err(_) => {
            if let Some(message) = session.error_message().await {
                println!("{message}");
            }
        }
    }

    print_help();
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        let (command, rest) = match input.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (input, ""),
        };

        match command {
            "search" => {
                session.search().set_query(rest).await;
                // Give the debounce window time to elapse before rendering.
                tokio::time::sleep(debounce + std::time::Duration::from_millis(50)).await;
                let suggestions = session.search().suggestions().await;
                if suggestions.is_empty() {
                    println!("no matches");
                } else {
                    for (index, suggestion) in suggestions.iter().enumerate() {
                        println!("  {}. {suggestion}", index + 1);
                    }
                }
            }
            "pick" => {
                let suggestions = session.search().suggestions().await;
                let picked = rest
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| suggestions.get(index));
                match picked {
                    Some(symptom) => {
                        session.select_suggestion(symptom).await;
                        println!("selected: {}", session.selection().await.join(", "));
                    }
                    None => println!("no such suggestion"),
                }
            }
            "add" if !rest.is_empty() => {
                session.select_suggestion(rest).await;
                println!("selected: {}", session.selection().await.join(", "));
            }
            "remove" if !rest.is_empty() => {
                session.remove_symptom(rest).await;
                println!("selected: {}", session.selection().await.join(", "));
            }
            "list" => println!("selected: {}", session.selection().await.join(", ")),
            "predict" => {
                if session.is_in_flight().await {
                    println!("a prediction is already in flight");
                    continue;
                }
                session.submit_prediction().await;
                render_outcome(&session).await;
            }
            "help" => print_help(),
            "quit" | "exit" => break,
            "" => {}
            other => println!("unknown command '{other}' (try 'help')"),
        }
    }

    Ok(())
}

/// Errors take display priority, but a result from an earlier successful
/// call stays on screen below them.
async fn render_outcome(session: &CheckerSession) {
    if let Some(message) = session.error_message().await {
        println!("error: {message}");
    }
    if let Some(prediction) = session.prediction().await {
        println!("random forest : {}", prediction.rf_model_prediction);
        println!("naive bayes   : {}", prediction.naive_bayes_prediction);
        println!("svm           : {}", prediction.svm_model_prediction);
        println!("consensus     : {}", prediction.final_prediction);
    }
}

fn print_help() {
    println!("commands:");
    println!("  search <text>   search the symptom vocabulary");
    println!("  pick <n>        select the n-th suggestion");
    println!("  add <symptom>   select a symptom by name");
    println!("  remove <symptom>");
    println!("  list            show the current selection");
    println!("  predict         submit the selection to the ensemble");
    println!("  quit");
}
