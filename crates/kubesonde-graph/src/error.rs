use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplorerError {
    #[error("pods without a deployment cannot be grouped: {0}")]
    UngroupedDeployment(String),
    #[error("unknown deployment: {0}")]
    UnknownDeployment(String),
}
