use std::env;
use std::sync::Arc;

use cartridge_agent::artifact::GitCommandRepository;
use cartridge_agent::artifact::PlainTextDecryptor;
use cartridge_agent::config::AgentConfig;
use cartridge_agent::event::StdoutPublisher;
use cartridge_agent::event::read_feed;
use cartridge_agent::extension::ScriptExtensionRunner;
use cartridge_agent::node::AgentBuilder;
use cartridge_agent::node::Collaborators;
use cartridge_agent::topology::TopologyContext;
use tokio::io::BufReader;
use tokio::signal;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Logs go to stderr; stdout carries published status events.
  tracing_subscriber::registry()
    .with(EnvFilter::new(
      env::var("RUST_LOG").unwrap_or_else(|_| "cartridge_agent=info".into()),
    ))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let args: Vec<String> = env::args().collect();
  let config_path = if args.len() > 2 && args[1] == "--conf" {
    args[2].clone()
  } else {
    eprintln!("Usage: {} --conf <config-file>", args[0]);
    eprintln!("Example: {} --conf conf/agent.toml", args[0]);
    std::process::exit(1);
  };

  let config = AgentConfig::load(&config_path)?;
  info!(path = %config_path, "Configuration loaded");

  let topology = Arc::new(TopologyContext::new());
  let collaborators = Collaborators {
    topology: topology.clone(),
    repository: Arc::new(GitCommandRepository::new()),
    decryptor: Arc::new(PlainTextDecryptor),
    extensions: Arc::new(ScriptExtensionRunner::new(config.extensions_dir.clone())),
    publisher: Arc::new(StdoutPublisher::stdout()),
  };

  let agent = AgentBuilder::new(config).build(collaborators)?;

  let events = agent.sender();
  let feed = tokio::spawn(async move {
    let stdin = BufReader::new(tokio::io::stdin());
    match read_feed(stdin, &topology, &events).await {
      Ok(accepted) => info!(accepted, "Inbound feed closed"),
      Err(e) => error!(error = %e, "Inbound feed failed"),
    }
  });

  tokio::select! {
    _ = signal::ctrl_c() => info!("Interrupt received"),
    _ = feed => {}
  }

  agent.shutdown().await;
  Ok(())
}
