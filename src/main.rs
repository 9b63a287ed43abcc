use botty::game::Game;
use botty::infra::{DefaultObserver, StdioSimulation};
use botty::planners::rl::{AgentConfig, AgentLoop, ProductionQueues};
use dotenv::dotenv;
use std::env;
use std::io;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("botty=debug,info"));

    // stdout carries the command stream
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let config = AgentConfig::from_env()?;
    let policy_path = env::var("BOTTY_POLICY_PATH").ok();
    let transcripts_folder = env::var("BOTTY_TRANSCRIPTS_FOLDER").ok();

    info!(
        "Learning rate {}, discount {}, exploration {}",
        config.learning_rate, config.discount, config.exploration
    );

    let mut agent = AgentLoop::new(&config, ProductionQueues::opening())?;
    if let Some(path) = &policy_path
        && Path::new(path).exists()
    {
        agent.policy_mut().load(path)?;
        info!("Loaded {} policy rows from {}", agent.policy().len(), path);
    }

    let simulation = StdioSimulation::new(io::stdin().lock(), io::stdout().lock());
    let mut game = Game::new(simulation, agent, DefaultObserver);
    if let Some(folder) = transcripts_folder {
        game = game.with_transcripts(folder);
    }

    let episodes = game.run()?;
    let total_reward: f64 = episodes.iter().map(|stats| stats.total_reward).sum();
    info!("Played {} episode(s), total reward {}", episodes.len(), total_reward);

    if let Some(path) = &policy_path {
        game.agent().policy().save(path)?;
        info!("Saved {} policy rows to {}", game.agent().policy().len(), path);
    }

    Ok(())
}
