use std::time::Duration;

use termin_reflection::ReflectionAgent;
use tracing::{error, info};

/// Arguments for the `reflect` command: a single cycle, or a cron-style
/// runner ticking every `interval_min`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectInput {
    pub run_loop: bool,
}

pub struct ReflectStrategy {
    pub agent: ReflectionAgent,
    pub interval_min: u64,
}

impl super::CommandStrategy for ReflectStrategy {
    type Input = ReflectInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        if !input.run_loop {
            return self.run_once().await;
        }

        let mut ticker = tokio::time::interval(Duration::from_secs(self.interval_min * 60));
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once().await {
                error!(%err, "reflection cycle failed, will retry next tick");
            }
        }
    }
}

impl ReflectStrategy {
    async fn run_once(&self) -> anyhow::Result<()> {
        let outcome = self.agent.run_cycle().await?;
        info!(
            persons_updated = outcome.persons_updated,
            persons_skipped_unknown = outcome.persons_skipped_unknown,
            gaps = outcome.gaps_identified.len(),
            "reflection cycle complete"
        );
        println!(
            "reflection cycle: {} person(s) updated, {} skipped (unknown), {} gap(s) noted",
            outcome.persons_updated,
            outcome.persons_skipped_unknown,
            outcome.gaps_identified.len()
        );
        for gap in &outcome.gaps_identified {
            println!("  gap: {gap}");
        }
        Ok(())
    }
}
