use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] crate::client::Error),

    #[error("no builds found for job '{0}'")]
    NoBuildsFound(String),
}
