//! Bridges the CLI configuration to the `msggen` engine.

use tracing::debug;

use crate::config::Config;
use crate::error::CliResult;
use msggen::{GeneratedOutput, Generator, Receiver, TypeTable};

/// Produces every artifact for a set of receivers.
pub struct ArtifactGenerator {
    generator: Generator,
}

impl ArtifactGenerator {
    /// Build a generator from configuration.
    ///
    /// Fails when the `[types]` table names a malformed header.
    pub fn new(config: &Config) -> CliResult<Self> {
        let table = TypeTable::builtin().with_extension(config.types.clone())?;
        let generator = Generator::new(config.generator_config()).with_type_table(table);
        Ok(Self { generator })
    }

    /// Generate all artifacts in memory.
    pub fn generate(&self, receivers: &[Receiver]) -> CliResult<GeneratedOutput> {
        let output = self.generator.generate(receivers)?;
        debug!(
            receivers = receivers.len(),
            files = output.len(),
            "artifacts generated"
        );
        Ok(output)
    }
}
