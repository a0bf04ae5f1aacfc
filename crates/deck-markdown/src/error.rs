use thiserror::Error;

/// Failures while splitting and deserializing the document's static
/// structure: front-matter and block boundaries. Per-slide config comments
/// that fail to parse as JSON are *not* an error here — they fall back to a
/// speaker-note line (see `config.rs`).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("front matter is not valid YAML: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

/// Failures while turning a parsed document into canonical slides: these can
/// only arise from the parts of projection that actually run user-supplied
/// code (the conditional-defaults expression and the code-block renderer).
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("parsing failed: {0}")]
    Parse(#[from] ParseError),
    #[error("defaults expression failed to compile: {0}")]
    ExprCompile(String),
    #[error("defaults expression failed to evaluate: {0}")]
    ExprEval(String),
    #[error("code block rendering command failed: {0}")]
    CodeImage(String),
}
