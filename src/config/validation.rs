//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bind address parses)
//! - Check the static directory exists
//! - In strict mode, reject rewrite rules without a pattern or destination
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::rewrite::Route;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("static directory '{0}' does not exist")]
    MissingDirectory(String),

    #[error("rewrite rule '{0}' needs a pattern and a destination")]
    MalformedRule(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if !Path::new(&config.static_files.directory).is_dir() {
        errors.push(ValidationError::MissingDirectory(config.static_files.directory.clone()));
    }

    if config.rewrite.strict {
        errors.extend(
            config
                .rewrite
                .rules
                .iter()
                .filter(|rule| !Route::parse(rule).has_destination())
                .map(|rule| ValidationError::MalformedRule(rule.clone())),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
