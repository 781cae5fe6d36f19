//! Error types for the movement controllers

use thiserror::Error;

/// Why a grapple or swing did not start.
///
/// None of these are fatal: the orchestrator logs them and carries on
/// with normal locomotion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraversalError {
    #[error("grapple on cooldown ({remaining:.2}s remaining)")]
    OnCooldown { remaining: f32 },

    #[error("no grappleable surface within {range}m")]
    NoTarget { range: f32 },

    #[error("no swing point predicted")]
    NoPrediction,

    #[error("character has no physics body")]
    MissingBody,

    #[error("mechanic is already active")]
    AlreadyActive,
}

/// Configuration loading and editing errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Option {0} exists in several tables, qualify it as table.field")]
    AmbiguousOption(String),

    #[error("Invalid value for {option}: {reason}")]
    Invalid { option: &'static str, reason: String },
}
