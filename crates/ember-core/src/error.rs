//! Error types for Ember

use thiserror::Error;

/// The main error type for Ember operations
#[derive(Debug, Error)]
pub enum EmberError {
    #[error("Duplicate component: entity {entity} already has {component}")]
    DuplicateComponent { entity: String, component: String },

    #[error("Missing component: entity {entity} has no {component}")]
    MissingComponent { entity: String, component: String },

    #[error("Stale entity: {0}")]
    StaleEntity(String),

    #[error("Invalid keyframe table: {0}")]
    InvalidKeyframeTable(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, EmberError>;

impl From<toml::de::Error> for EmberError {
    fn from(err: toml::de::Error) -> Self {
        EmberError::TomlParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_errors_convert() {
        let err: EmberError = toml::from_str::<toml::value::Table>("= nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, EmberError::TomlParseError(_)));
    }

    #[test]
    fn messages_name_the_component() {
        let err = EmberError::DuplicateComponent {
            entity: "7v1".into(),
            component: "Position".into(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate component: entity 7v1 already has Position"
        );
    }
}
