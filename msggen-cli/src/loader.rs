//! Turns scanned model documents into receivers.

use tracing::debug;

use crate::error::{CliResult, LoadError};
use crate::scanner::ModelFile;
use msggen::{Receiver, ReceiverDocument};

/// Parses and validates model documents.
#[derive(Debug, Default)]
pub struct ModelLoader;

impl ModelLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load one document.
    pub fn load_file(&self, file: &ModelFile) -> Result<Receiver, LoadError> {
        let receiver = ReceiverDocument::from_json(&file.content)
            .and_then(ReceiverDocument::into_receiver)
            .map_err(|e| LoadError::model(&file.relative_path, e))?;
        debug!(
            file = %file.relative_path.display(),
            receiver = %receiver.name,
            messages = receiver.messages.len(),
            "loaded receiver"
        );
        Ok(receiver)
    }

    /// Load every document, collecting failures instead of stopping at the first.
    pub fn load_files(&self, files: &[ModelFile]) -> (Vec<Receiver>, Vec<LoadError>) {
        let mut receivers = Vec::new();
        let mut errors = Vec::new();

        for file in files {
            match self.load_file(file) {
                Ok(receiver) => receivers.push(receiver),
                Err(e) => errors.push(e),
            }
        }

        (receivers, errors)
    }

    /// Load every document, failing if any of them is invalid.
    pub fn load_all(&self, files: &[ModelFile]) -> CliResult<Vec<Receiver>> {
        let (receivers, mut errors) = self.load_files(files);
        match errors.len() {
            0 => Ok(receivers),
            1 => Err(errors.remove(0).into()),
            _ => Err(LoadError::Multiple(errors).into()),
        }
    }
}
