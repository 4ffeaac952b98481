/// All errors that can occur while handling a bot action.
///
/// The first group are expected outcomes of a user action (see [`BotError::is_rejection`]);
/// the rest are faults of the bot or the platform.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("person is already on duty")]
    AlreadyActive,

    #[error("person is not on duty")]
    NotActive,

    #[error("display name does not start with a badge number")]
    InvalidNameFormat,

    #[error("requester already has an open ticket")]
    DuplicateTicket,

    #[error("requester lacks an authorized role")]
    Unauthorized,

    #[error("target identity could not be resolved")]
    TargetNotFound,

    #[error("direct message could not be delivered")]
    DeliveryFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Custom(String),
}

impl BotError {
    /// True for user-facing outcomes that are answered privately and never logged as faults.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BotError::AlreadyActive
                | BotError::NotActive
                | BotError::InvalidNameFormat
                | BotError::DuplicateTicket
                | BotError::Unauthorized
                | BotError::TargetNotFound
                | BotError::DeliveryFailed
        )
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
