use thiserror::Error;

/// A snapshot read failed. Any read failure aborts the run.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("authentication with the data source failed: {0}")]
    Auth(String),

    #[error("transport error reading '{path}': {message}")]
    Transport { path: String, message: String },

    #[error("data source returned {status} for '{path}': {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("could not decode '{path}': {message}")]
    Decode { path: String, message: String },
}

/// A single email could not be delivered. Never fatal for the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("mail provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid template '{name}': {message}")]
    Template { name: &'static str, message: String },

    #[error("rendering '{name}' failed: {message}")]
    Render { name: &'static str, message: String },
}
