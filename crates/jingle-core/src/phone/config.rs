//! Phone configuration
//!
//! ```rust
//! use jingle_core::PhoneConfig;
//!
//! let config = PhoneConfig::new()
//!     .with_ring_tone("tones/ring.wav")
//!     .with_ringback_tone("tones/ringback.wav")
//!     .with_sid_prefix("desk");
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.ring_tone.as_deref(), Some("tones/ring.wav"));
//! ```
//!
//! Settings can also be read from TOML:
//!
//! ```rust
//! use jingle_core::PhoneConfig;
//!
//! let config = PhoneConfig::from_toml_str(r#"
//!     ring_tone = "ring.wav"
//!     event_buffer = 64
//! "#).unwrap();
//!
//! assert_eq!(config.event_buffer, 64);
//! assert_eq!(config.sid_prefix, "jingle");
//! assert!(config.ringback_tone.is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CallError, Result};

pub const DEFAULT_SID_PREFIX: &str = "jingle";
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Configuration of a [`crate::Phone`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneConfig {
    /// Tone played on a session when an incoming call arrives
    pub ring_tone: Option<String>,
    /// Tone played on a session when the remote party reports ringing
    pub ringback_tone: Option<String>,
    /// Prefix of locally generated session identifiers
    pub sid_prefix: String,
    /// Capacity of the inbound event channel of an in-memory gateway
    pub event_buffer: usize,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            ring_tone: None,
            ringback_tone: None,
            sid_prefix: DEFAULT_SID_PREFIX.to_string(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl PhoneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ring_tone(mut self, tone: impl Into<String>) -> Self {
        self.ring_tone = Some(tone.into());
        self
    }

    pub fn with_ringback_tone(mut self, tone: impl Into<String>) -> Self {
        self.ringback_tone = Some(tone.into());
        self
    }

    pub fn with_sid_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sid_prefix = prefix.into();
        self
    }

    pub fn with_event_buffer(mut self, buffer: usize) -> Self {
        self.event_buffer = buffer;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sid_prefix.trim().is_empty() {
            return Err(CallError::config("sid_prefix must not be empty"));
        }
        if self.sid_prefix.chars().any(char::is_whitespace) {
            return Err(CallError::config("sid_prefix must not contain whitespace"));
        }
        if self.event_buffer == 0 {
            return Err(CallError::config("event_buffer must be greater than zero"));
        }
        Ok(())
    }
}
