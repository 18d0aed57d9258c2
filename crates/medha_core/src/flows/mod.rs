//! crates/medha_core/src/flows/mod.rs
//!
//! The orchestration flows, one per user-facing feature, and the context they share.
//!
//! A flow renders a prompt, calls the model, merges the results and persists them.
//! Only the primary structured completion can fail a flow; auxiliary media and
//! persistence failures are logged and degrade the result instead.

pub mod essay;
pub mod explain;
pub mod my_tutor;
pub mod profile;
pub mod quiz;
pub mod reflection;
pub mod talk_buddy;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{error, info, warn};

use crate::ports::{
    DatabaseService, ImageGenerationService, ImageSearchService, ModelPrompt, PortError,
    PortResult, StructuredCompletionService, TextToSpeechService,
};
use crate::schema::{OutputShape, SchemaError};

//=========================================================================================
// Flow Error and Result Types
//=========================================================================================

/// The ways a flow invocation can fail outright.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The request was rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] SchemaError),

    /// The primary model call produced nothing usable.
    #[error("The model produced no usable output: {0}")]
    NoOutput(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Inline media larger than this is not written to the store.
pub const MAX_INLINE_MEDIA_LEN: usize = 1_048_487;

/// Drops media too large to store, keeping everything else.
pub(crate) fn size_guard(what: &str, media: Option<String>) -> Option<String> {
    match media {
        Some(data) if data.len() > MAX_INLINE_MEDIA_LEN => {
            warn!(
                "Not storing {} data of {} bytes; it exceeds the record size limit.",
                what,
                data.len()
            );
            None
        }
        other => other,
    }
}

//=========================================================================================
// Call Timeouts
//=========================================================================================

/// Upper bounds for each kind of external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeouts {
    /// Structured completions a flow cannot do without.
    pub primary: Duration,
    /// Image and speech generation, which degrade silently.
    pub auxiliary: Duration,
    /// Record store reads and writes.
    pub store: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            primary: Duration::from_secs(120),
            auxiliary: Duration::from_secs(45),
            store: Duration::from_secs(10),
        }
    }
}

//=========================================================================================
// FlowContext (Shared By All Flow Invocations)
//=========================================================================================

/// Client handles injected into every flow, constructed once at startup.
#[derive(Clone)]
pub struct FlowContext {
    pub completion: Arc<dyn StructuredCompletionService>,
    pub images: Arc<dyn ImageGenerationService>,
    pub image_search: Arc<dyn ImageSearchService>,
    pub speech: Arc<dyn TextToSpeechService>,
    pub db: Arc<dyn DatabaseService>,
    pub timeouts: CallTimeouts,
}

impl FlowContext {
    /// Runs a primary structured completion and validates its output.
    /// Any failure here is fatal to the calling flow.
    pub(crate) async fn complete<T>(
        &self,
        prompt: &ModelPrompt,
        shape: &OutputShape,
        parse: fn(Value) -> Result<T, SchemaError>,
    ) -> FlowResult<T> {
        let started = Instant::now();
        let value = tokio::time::timeout(
            self.timeouts.primary,
            self.completion.complete_structured(prompt, shape),
        )
        .await
        .map_err(|_| FlowError::Timeout(shape.name, self.timeouts.primary))??;
        info!("⏱️ {} completion took: {:?}", shape.name, started.elapsed());

        let value = value.ok_or_else(|| FlowError::NoOutput(format!("{} was empty", shape.name)))?;
        parse(value).map_err(|e| FlowError::NoOutput(e.to_string()))
    }

    /// Runs an auxiliary step under the short timeout. A failure is logged and yields `None`.
    pub(crate) async fn degrade<T, F>(&self, what: &str, call: F) -> Option<T>
    where
        F: Future<Output = PortResult<Option<T>>>,
    {
        match tokio::time::timeout(self.timeouts.auxiliary, call).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!("{} failed, skipping: {}", what, e);
                None
            }
            Err(_) => {
                warn!("{} timed out after {:?}, skipping", what, self.timeouts.auxiliary);
                None
            }
        }
    }

    /// Synthesizes speech for `text`, or `None` if synthesis fails.
    pub(crate) async fn speak(&self, text: &str) -> Option<String> {
        self.degrade("Speech synthesis", async {
            self.speech.generate_speech(text).await.map(Some)
        })
        .await
    }

    /// Runs a store write under the store timeout, logging any failure.
    pub(crate) async fn store_write<F>(&self, what: &str, write: F) -> PortResult<()>
    where
        F: Future<Output = PortResult<()>>,
    {
        let result = match tokio::time::timeout(self.timeouts.store, write).await {
            Ok(result) => result,
            Err(_) => Err(PortError::Unexpected(format!(
                "timed out after {:?}",
                self.timeouts.store
            ))),
        };
        if let Err(e) = &result {
            error!("Failed to save {}: {}", what, e);
        }
        result
    }

    /// Runs a store write whose failure only costs the saved copy.
    pub(crate) async fn persist<F>(&self, what: &str, write: F) -> bool
    where
        F: Future<Output = PortResult<()>>,
    {
        self.store_write(what, write).await.is_ok()
    }

    /// Runs a store read under the store timeout.
    pub(crate) async fn read<T, F>(&self, what: &'static str, read: F) -> FlowResult<T>
    where
        F: Future<Output = PortResult<T>>,
    {
        tokio::time::timeout(self.timeouts.store, read)
            .await
            .map_err(|_| FlowError::Timeout(what, self.timeouts.store))?
            .map_err(FlowError::from)
    }
}
