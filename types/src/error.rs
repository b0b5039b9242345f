#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid daemon type: {0}")]
    InvalidDaemonType(String),

    #[error("expecting unique client admin keyring, found {0}")]
    AmbiguousKeyring(usize),

    #[error("keyring entity has no caps configured: {0}")]
    MissingCaps(String),
}
