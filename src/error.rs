use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration error: {0} is not set")]
    MissingComponent(&'static str),

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Grammar exhausted: no enabled symbols {0}")]
    NoEnabledSymbols(String),

    #[error("Grammar exhausted: grammar has no terminal symbols {0}")]
    NoTerminalSymbols(String),

    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Failures raised while computing the value of a tree for one variable binding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("variable '{0}' is not bound")]
    UnknownVariable(String),

    #[error("{operation} is undefined for argument {argument}")]
    Domain { operation: &'static str, argument: f64 },

    #[error("{operation} expects {expected_min}..={expected_max} arguments, got {actual}")]
    Arity {
        operation: String,
        expected_min: usize,
        expected_max: usize,
        actual: usize,
    },

    #[error("compilation failed: {0}")]
    Compilation(String),
}

pub type Result<T> = std::result::Result<T, GpError>;
