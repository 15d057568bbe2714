use termin_config::Config;

/// Strategy for initializing the configuration.
///
/// Creates the default configuration file at `~/termin/config.json`.
///
/// # Design
/// - Zero-allocation: No heap allocation
/// - Static dispatch: All method calls are monomorphized
/// - Stateless: No internal state, simplest form of strategy
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let dir = Config::ensure_config_dir()?;
        Config::create_default_at(&dir.join("config.json"))?;
        println!("Wrote default config to {}", dir.join("config.json").display());
        Ok(())
    }
}
