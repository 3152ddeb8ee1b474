//! Client configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `KAFKA_CLIENT_ID` | `kafkaesque-client` | client id stamped on every request |
//! | `KAFKA_MAX_MESSAGE_SIZE` | 100 MB | largest response frame accepted |

use crate::constants::{DEFAULT_CLIENT_ID, DEFAULT_MAX_MESSAGE_SIZE};
use crate::error::{Error, Result};

/// Settings a [`Session`](crate::client::Session) applies to every exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Sent in every request header. `None` encodes as a null string.
    pub client_id: Option<String>,

    /// Responses larger than this are rejected before decoding.
    pub max_message_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: Some(DEFAULT_CLIENT_ID.to_string()),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn without_client_id(mut self) -> Self {
        self.client_id = None;
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Load from the process environment, falling back to defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let client_id = lookup("KAFKA_CLIENT_ID").or(defaults.client_id);

        let max_message_size = match lookup("KAFKA_MAX_MESSAGE_SIZE") {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("Invalid KAFKA_MAX_MESSAGE_SIZE: {}", e)))?,
            None => defaults.max_message_size,
        };

        let config = Self {
            client_id,
            max_message_size,
        };
        config
            .validate()
            .map_err(|errors| Error::Config(errors.join("; ")))?;
        Ok(config)
    }

    /// Check every setting, collecting all problems rather than stopping at
    /// the first.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(client_id) = &self.client_id {
            if client_id.len() > i16::MAX as usize {
                errors.push(format!(
                    "client_id length ({}) exceeds the protocol maximum of {}",
                    client_id.len(),
                    i16::MAX
                ));
            }
        }

        if self.max_message_size == 0 {
            errors.push("max_message_size must be greater than 0".to_string());
        } else if self.max_message_size > i32::MAX as usize {
            errors.push(format!(
                "max_message_size ({}) exceeds the protocol maximum of {}",
                self.max_message_size,
                i32::MAX
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
