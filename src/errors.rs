use std::fmt;

#[derive(Debug, Clone)]
pub enum ShortgateError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    Storage(String),
    Collision(String),
    Validation(String),
    Verification(String),
    ChallengeRequired(String),
}

impl ShortgateError {
    /// Stable error code, used in logs and structured responses.
    pub fn code(&self) -> &'static str {
        match self {
            ShortgateError::DatabaseConfig(_) => "E001",
            ShortgateError::DatabaseConnection(_) => "E002",
            ShortgateError::Storage(_) => "E003",
            ShortgateError::Collision(_) => "E004",
            ShortgateError::Validation(_) => "E005",
            ShortgateError::Verification(_) => "E006",
            ShortgateError::ChallengeRequired(_) => "E007",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ShortgateError::DatabaseConfig(_) => "Database Configuration Error",
            ShortgateError::DatabaseConnection(_) => "Database Connection Error",
            ShortgateError::Storage(_) => "Storage Error",
            ShortgateError::Collision(_) => "Short Id Collision",
            ShortgateError::Validation(_) => "Validation Error",
            ShortgateError::Verification(_) => "Captcha Verification Error",
            ShortgateError::ChallengeRequired(_) => "Challenge Required",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ShortgateError::DatabaseConfig(msg) => msg,
            ShortgateError::DatabaseConnection(msg) => msg,
            ShortgateError::Storage(msg) => msg,
            ShortgateError::Collision(msg) => msg,
            ShortgateError::Validation(msg) => msg,
            ShortgateError::Verification(msg) => msg,
            ShortgateError::ChallengeRequired(msg) => msg,
        }
    }

    /// Collision is the only error the shorten pipeline recovers from
    /// locally, so it gets a dedicated check.
    pub fn is_collision(&self) -> bool {
        matches!(self, ShortgateError::Collision(_))
    }
}

impl fmt::Display for ShortgateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for ShortgateError {}

// Convenience constructors
impl ShortgateError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortgateError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShortgateError::DatabaseConnection(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        ShortgateError::Storage(msg.into())
    }

    pub fn collision<T: Into<String>>(msg: T) -> Self {
        ShortgateError::Collision(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortgateError::Validation(msg.into())
    }

    pub fn verification<T: Into<String>>(msg: T) -> Self {
        ShortgateError::Verification(msg.into())
    }

    pub fn challenge_required<T: Into<String>>(msg: T) -> Self {
        ShortgateError::ChallengeRequired(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortgateError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortgateError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for ShortgateError {
    fn from(err: std::io::Error) -> Self {
        ShortgateError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ShortgateError::validation("x").code(), "E005");
        assert_eq!(ShortgateError::collision("x").code(), "E004");
        assert_eq!(ShortgateError::verification("x").code(), "E006");
        assert_eq!(ShortgateError::challenge_required("x").code(), "E007");
    }

    #[test]
    fn test_display_includes_type_and_message() {
        let err = ShortgateError::storage("insert failed");
        let text = err.to_string();
        assert!(text.contains("Storage Error"));
        assert!(text.contains("insert failed"));
    }

    #[test]
    fn test_is_collision() {
        assert!(ShortgateError::collision("dup").is_collision());
        assert!(!ShortgateError::storage("down").is_collision());
    }

    #[test]
    fn test_from_db_err() {
        let err: ShortgateError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, ShortgateError::Storage(_)));
    }
}
