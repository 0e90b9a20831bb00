pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The reasons a new transaction can be rejected before it touches the store. Each rule has its
/// own message so that the caller can tell the user exactly what to fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("The description cannot be empty")]
    EmptyDescription,

    #[error("'{0}' is not a valid amount, enter a number such as 1500 or 12.50")]
    InvalidAmount(String),

    #[error("The amount must be greater than zero, got {0}")]
    NonPositiveAmount(String),

    #[error("The amount {0} is too large, the limit is 999 999 999 999 999")]
    AmountTooLarge(String),

    #[error("The amount {0} is too precise, use at most 15 significant digits")]
    TooPrecise(String),

    #[error("'{0}' is not a valid date, use the YYYY-MM-DD format")]
    InvalidDate(String),

    #[error("An expense needs a category")]
    MissingCategory,

    #[error("'all' is reserved for filters and cannot be a category")]
    ReservedCategory,
}
