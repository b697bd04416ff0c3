/// Core error type for the export bot.
///
/// Adapter crates map their specific errors into this type so the command
/// boundary can report every failure the same way.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("time data '{value}' does not match format '%Y-%m-%d %H:%M:%S'")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("this command can only be used inside a server")]
    NotInGuild,

    #[error("attachment {name} is too large ({size} bytes, max {max} bytes)")]
    AttachmentTooLarge { name: String, size: u64, max: u64 },

    #[error("render error: {0}")]
    Render(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
