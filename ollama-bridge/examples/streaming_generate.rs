use std::io::Write;

use futures::StreamExt;
use ollama_bridge::{types::generate::GenerateRequest, ClientConfig, OllamaClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = OllamaClient::builder()
        .config(ClientConfig::from_env()?)
        .build()?;

    let model = "qwen3:latest";
    let prompt = "Tell me a story about a Rust programmer.";

    let mut stream = client
        .generate_stream(GenerateRequest::new(model, prompt))
        .await?;

    while let Some(token) = stream.next().await {
        match token {
            Ok(token) => {
                print!("{}", token);
                std::io::stdout().flush()?;
            }
            Err(e) => {
                eprintln!("\nGenerate Error: {}", e);
                break;
            }
        }
    }
    println!();

    Ok(())
}
