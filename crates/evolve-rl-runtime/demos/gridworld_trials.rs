//! Example: compare REINFORCE and BBO on the gridworld
//!
//! Pass a JSON trial config path to run a single custom configuration.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use evolve_rl_agent::{AgentConfig, BboConfig, ReinforceConfig};
use evolve_rl_runtime::{publish, CsvSink, JsonSink, SummarySink, TrialConfig, TrialRunner};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let configs = match std::env::args().nth(1) {
        Some(path) => vec![TrialConfig::from_json_file(path)?],
        None => vec![
            TrialConfig {
                agent: AgentConfig::Reinforce(ReinforceConfig::default()),
                trials: 20,
                output_stem: "reinforce".to_string(),
                ..TrialConfig::default()
            },
            TrialConfig {
                agent: AgentConfig::Bbo(BboConfig::default()),
                trials: 20,
                output_stem: "bbo".to_string(),
                ..TrialConfig::default()
            },
        ],
    };

    for config in configs {
        let returns = TrialRunner::from_config(config.clone()).run().await?;
        let summary = returns.summarize();

        let last = summary.len().saturating_sub(100)..summary.len();
        println!(
            "{}: mean return over the last {} episodes = {:.3}",
            config.agent.name(),
            last.len(),
            summary.window_mean(last.clone()).unwrap_or_default()
        );

        let mut sinks: Vec<Box<dyn SummarySink>> = vec![
            Box::new(CsvSink::new(&config.output_stem)),
            Box::new(JsonSink::new(format!("{}_report.json", config.output_stem), config.clone())),
        ];
        if let Err(e) = publish(&summary, &mut sinks).await {
            eprintln!("Could not save results for {}: {e:#}", config.agent.name());
        }
    }

    Ok(())
}
