//! Static strategy pattern for CLI commands.
//!
//! This module implements a zero-allocation, static dispatch strategy pattern.
//! Each command is a separate strategy with its own type, enabling
//! compile-time optimization and zero runtime overhead.

mod bootstrap;
mod init;
mod process;
mod reconcile;
mod reflect;
mod version;

pub use bootstrap::{BootstrapInput, BootstrapStrategy};
pub use init::InitStrategy;
pub use process::{ProcessInput, ProcessStrategy};
pub use reconcile::ReconcileStrategy;
pub use reflect::{ReflectInput, ReflectStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// # Design Principles
/// - **Zero allocation**: No heap allocation required
/// - **Static dispatch**: All calls are monomorphized at compile time
/// - **Type safety**: Each strategy defines its own input type via associated type
/// - **Extensibility**: Adding new commands requires only implementing this trait
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
