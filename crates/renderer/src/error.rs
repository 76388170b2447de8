use thiserror::Error;

/// Program construction failures, tagged with the stage that failed.
///
/// These are recoverable: a failed build during a shader switch leaves the
/// session alive in its degraded state, and the diagnostic is surfaced to the
/// caller for display.
#[derive(Debug, Error)]
pub enum ShaderBuildError {
    #[error("vertex stage failed to compile: {0}")]
    VertexCompileFailed(String),
    #[error("fragment stage failed to compile: {0}")]
    FragmentCompileFailed(String),
    #[error("program link failed: {0}")]
    LinkFailed(String),
}

impl ShaderBuildError {
    /// The compiler/linker diagnostic carried by this error.
    pub fn diagnostic(&self) -> &str {
        match self {
            Self::VertexCompileFailed(text)
            | Self::FragmentCompileFailed(text)
            | Self::LinkFailed(text) => text,
        }
    }
}

/// Session lifecycle failures. Context and geometry errors are fatal at
/// startup; build errors are recoverable after initialisation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no compatible GPU context available: {0}")]
    ContextUnavailable(String),
    #[error("failed to create full-screen quad geometry: {0}")]
    GeometryCreationFailed(String),
    #[error(transparent)]
    Build(#[from] ShaderBuildError),
}
