//! Contract compilation interface.
//!
//! Deployment needs init code. Real compilation belongs to an external
//! service; [`PlaceholderCompiler`] ships a fixed minimal artifact so the
//! generate → audit → deploy flow can be exercised end to end.

use alloy_primitives::Bytes;
use async_trait::async_trait;
use thiserror::Error;
use web3_agentic::GeneratedContract;

/// Minimal init code that deploys an empty runtime.
pub const PLACEHOLDER_BYTECODE: [u8; 40] = [
    0x60, 0x80, 0x60, 0x40, 0x52, 0x34, 0x80, 0x15, 0x60, 0x0f, 0x57, 0x60, 0x00, 0x80, 0xfd,
    0x5b, 0x50, 0x60, 0x06, 0x80, 0x60, 0x1d, 0x60, 0x00, 0x39, 0x60, 0x00, 0xf3, 0xfe, 0x60,
    0x80, 0x60, 0x40, 0x52, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub const DEFAULT_CONTRACT_NAME: &str = "Smart Contract";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compiler rejected {name}: {message}")]
    Rejected { name: String, message: String },
    #[error("compiler service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub bytecode: Bytes,
    pub contract_name: String,
    /// Source the artifact was built from, kept for the record
    pub source_code: Option<String>,
}

#[async_trait]
pub trait ContractCompiler: Send + Sync {
    /// Compiles generated source, or returns a default artifact when there
    /// is none.
    async fn compile(
        &self,
        source: Option<&GeneratedContract>,
    ) -> Result<CompiledArtifact, CompileError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderCompiler;

#[async_trait]
impl ContractCompiler for PlaceholderCompiler {
    async fn compile(
        &self,
        source: Option<&GeneratedContract>,
    ) -> Result<CompiledArtifact, CompileError> {
        if let Some(generated) = source {
            tracing::info!(
                name = %generated.name,
                compiler = %generated.compiler_version,
                "substituting placeholder bytecode for generated source"
            );
        }
        Ok(CompiledArtifact {
            bytecode: Bytes::from_static(&PLACEHOLDER_BYTECODE),
            contract_name: source
                .map(|g| g.name.clone())
                .unwrap_or_else(|| DEFAULT_CONTRACT_NAME.to_string()),
            source_code: source.map(|g| g.source_code.clone()),
        })
    }
}
