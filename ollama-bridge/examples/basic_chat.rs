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

    let request = ChatRequest::new("qwen3:latest")
        .add_message(ChatMessage::system("You are a concise assistant."))
        .add_message(ChatMessage::user("Why is Rust memory safe?"));

    let response = client.chat(request).await?;
    println!("{}", response.content().unwrap_or_default());
    if let Some(count) = response.get("eval_count") {
        println!("(evaluated {} tokens)", count);
    }

    Ok(())
}
