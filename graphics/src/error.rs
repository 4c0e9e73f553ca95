//! Graphics error types.

use std::fmt;

use crate::shader::ShaderProgram;

/// Which half of a shader build failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Parsing or validating the source.
    Compile,
    /// Resolving entry points into a program.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => f.write_str("compile"),
            Self::Link => f.write_str("link"),
        }
    }
}

/// Errors that can occur in the graphics system.
///
/// All of them are fatal for the precomputation pipeline: the first failure
/// aborts the run and is propagated to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// An input image could not be read or decoded.
    AssetLoadFailure(String),
    /// A shader program failed to build.
    ShaderBuildFailure {
        program: ShaderProgram,
        stage: ShaderStage,
        log: String,
    },
    /// A texture, buffer or target could not be allocated.
    ResourceExhaustion(String),
    /// The render-target state machine was driven out of order.
    InvariantViolation(String),
    /// The requested backend cannot be created on this machine.
    BackendUnavailable(String),
    /// The backend cannot execute the requested operation.
    Unsupported(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetLoadFailure(msg) => write!(f, "asset load failed: {msg}"),
            Self::ShaderBuildFailure {
                program,
                stage,
                log,
            } => write!(f, "shader {program} failed to {stage}: {log}"),
            Self::ResourceExhaustion(msg) => write!(f, "resource exhaustion: {msg}"),
            Self::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
            Self::BackendUnavailable(msg) => write!(f, "backend unavailable: {msg}"),
            Self::Unsupported(msg) => write!(f, "unsupported operation: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::InvariantViolation("no bake in progress".to_string());
        assert_eq!(err.to_string(), "invariant violation: no bake in progress");

        let err = GraphicsError::ShaderBuildFailure {
            program: ShaderProgram::Irradiance,
            stage: ShaderStage::Link,
            log: "missing fs_main".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "shader irradiance failed to link: missing fs_main"
        );
    }
}
