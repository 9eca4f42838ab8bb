use ollama_bridge::{ClientConfig, OllamaClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = OllamaClient::builder()
        .config(ClientConfig::from_env()?)
        .build()?;

    for model in client.list_models().await? {
        let size_gb = model.size as f64 / 1_000_000_000.0;
        println!("{:<32} {:>6.1} GB", model.name, size_gb);
    }

    Ok(())
}
