//! # Error Types
//!
//! The estimator itself is pure arithmetic and never fails; everything that can go
//! wrong happens at the edges, when raw numbers are turned into validated
//! [`UserProfile`](crate::UserProfile) and [`DrinkEvent`](crate::DrinkEvent) values,
//! or when the drink log and configuration touch the filesystem.

use std::io;
use thiserror::Error;

/// Errors raised while validating input or persisting state.
#[derive(Error, Debug)]
pub enum BacError {
    /// Body weight must be a finite number of kilograms above zero
    #[error("invalid weight: {0} kg (must be > 0)")]
    InvalidWeight(f64),

    /// Drink volume must be a finite number of millilitres above zero
    #[error("invalid volume: {0} ml (must be > 0)")]
    InvalidVolume(f64),

    /// Alcohol strength must be a finite percentage above zero
    #[error("invalid strength: {0}% (must be > 0)")]
    InvalidStrength(f64),

    /// Only the two Widmark categories are modelled
    #[error("unknown sex category: {0:?} (expected \"male\" or \"female\")")]
    UnknownSex(String),

    /// Wall-clock hour/minute that cannot be turned into an instant
    #[error("invalid time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    /// Timeline window with a non-positive step or a negative span
    #[error("invalid timeline window: {0}")]
    InvalidWindow(String),

    /// Drink log or config file could not be read or written
    #[error("storage IO: {0}")]
    Storage(#[from] io::Error),

    /// Drink log contents are not valid JSON for the expected shape
    #[error("drink log parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config file is not valid TOML for the expected shape
    #[error("config parse: {0}")]
    Config(#[from] toml::de::Error),

    /// Config could not be serialized back to TOML
    #[error("config write: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}
