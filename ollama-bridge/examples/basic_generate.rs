use ollama_bridge::{types::generate::GenerateRequest, ClientConfig, OllamaClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = OllamaClient::builder()
        .config(ClientConfig::from_env()?)
        .build()?;

    let request = GenerateRequest::new("qwen3:latest", "Write a haiku about the borrow checker.")
        .option("temperature", 0.7);
    let response = client.generate(request).await?;
    println!("{}", response);

    Ok(())
}
