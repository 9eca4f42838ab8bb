use std::io::Write;

use futures::StreamExt;
use ollama_bridge::{
    types::chat::{ChatMessage, ChatRequest},
    ClientConfig, OllamaClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = OllamaClient::builder()
        .config(ClientConfig::from_env()?)
        .build()?;

    let mut history = vec![ChatMessage::system("You are a helpful coding assistant.")];
    history.push(ChatMessage::user("Explain Rust's ownership in three sentences."));

    let request = ChatRequest::new("qwen3:latest").messages(history.clone());
    let mut stream = client.chat_stream(request).await?;
    let mut reply = String::new();

    while let Some(event) = stream.next().await {
        match event {
            Ok(chunk) => {
                let content = chunk.content().unwrap_or_default();
                print!("{}", content);
                std::io::stdout().flush()?;
                reply.push_str(content);
                if chunk.is_done() {
                    println!("\n[done: {}]", chunk.done_reason().unwrap_or("unknown"));
                }
            }
            Err(e) => {
                eprintln!("\nChat Error: {}", e);
                break;
            }
        }
    }

    history.push(ChatMessage::assistant(reply));
    println!("conversation now has {} messages", history.len());

    Ok(())
}
