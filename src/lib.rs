//! # BAC Tracker Core Library
//!
//! This library estimates Blood Alcohol Concentration (BAC, grams of alcohol per
//! litre of blood) from a self-reported drink log using a linearised Widmark model.
//!
//! ## Design Philosophy
//!
//! ### Pure Engine
//! - **No shared state**: every estimate is a pure function of the drinks, the
//!   profile and an explicitly supplied instant, so results are reproducible and the
//!   functions are safe to call from any number of threads
//! - **Validated inputs**: [`UserProfile`] and [`DrinkEvent`] can only be built from
//!   positive, finite numbers, which keeps the estimator free of NaN and infinity
//! - **No timers**: refreshing the display is the caller's job; the engine is simply
//!   re-invoked with a newer instant
//!
//! ### Temporal Resolution
//! The default timeline covers 8 hours of history and 4 hours of projection at
//! 5-minute steps:
//! - **145 samples total**: `(8 + 4) * 60 / 5 + 1`
//! - **Alternative window**: a trailing 24 h window at 15-minute steps (97 samples)
//!
//! ### Data Flow
//! 1. **Collect**: the caller builds [`DrinkEvent`]s (see [`time_utils`] for turning an
//!    hour/minute pick into an instant) and a [`UserProfile`]
//! 2. **Estimate**: [`estimator::estimate_bac`] yields the current BAC and safety status
//! 3. **Project**: [`timeline::generate_timeline`] samples the curve for charting and
//!    "sober at" lookups
//! 4. **Persist**: [`drink_log::DrinkLog`] owns load/save, pruning and clearing
//!
//! ## Core Types
//! - [`DrinkEvent`]: one logged drink
//! - [`UserProfile`]: body weight plus Widmark category
//! - [`TimelineSample`] / [`BacTimeline`]: the sampled curve

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub mod config;
pub mod drink_log;
pub mod error;
pub mod estimator;
pub mod renderer;
pub mod time_utils;
pub mod timeline;

pub use error::BacError;
pub use estimator::{estimate_bac, BacEstimate, BacModel, Status};
pub use timeline::{generate_timeline, BacTimeline, TimelineWindow};

/// Density of ethanol in g/mL, used to turn a volume of pure alcohol into grams.
pub const ETHANOL_DENSITY_G_PER_ML: f64 = 0.789;

/// Opaque, immutable identifier of a logged drink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrinkId(Uuid);

impl DrinkId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DrinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DrinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for DrinkId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One logged drink.
///
/// Fields are private so that every `DrinkEvent` in existence carries a positive,
/// finite volume and strength. Deserialized events go through the same checks as
/// [`DrinkEvent::new`].
///
/// # Example
/// ```
/// use bac_tracker_lib::DrinkEvent;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 7, 24, 20, 0, 0).unwrap();
/// let beer = DrinkEvent::new("Beer", 250.0, 5.0, at).unwrap();
/// assert!((beer.alcohol_grams() - 9.8625).abs() < 1e-9);
///
/// assert!(DrinkEvent::new("Nothing", 0.0, 5.0, at).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDrinkEvent")]
pub struct DrinkEvent {
    id: DrinkId,
    name: String,
    volume_ml: f64,
    strength_percent: f64,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawDrinkEvent {
    id: DrinkId,
    #[serde(default)]
    name: String,
    volume_ml: f64,
    strength_percent: f64,
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawDrinkEvent> for DrinkEvent {
    type Error = BacError;

    fn try_from(raw: RawDrinkEvent) -> Result<Self, Self::Error> {
        let mut event = DrinkEvent::new(raw.name, raw.volume_ml, raw.strength_percent, raw.timestamp)?;
        event.id = raw.id;
        Ok(event)
    }
}

impl DrinkEvent {
    /// Create a drink with a fresh id.
    ///
    /// An empty name is replaced by `"Drink <strength>%"`.
    pub fn new(
        name: impl Into<String>,
        volume_ml: f64,
        strength_percent: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, BacError> {
        if !(volume_ml.is_finite() && volume_ml > 0.0) {
            return Err(BacError::InvalidVolume(volume_ml));
        }
        if !(strength_percent.is_finite() && strength_percent > 0.0) {
            return Err(BacError::InvalidStrength(strength_percent));
        }

        let name = name.into();
        let name = if name.trim().is_empty() {
            format!("Drink {strength_percent}%")
        } else {
            name
        };

        Ok(Self {
            id: DrinkId::new(),
            name,
            volume_ml,
            strength_percent,
            timestamp,
        })
    }

    pub fn id(&self) -> DrinkId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Liquid volume in millilitres
    pub fn volume_ml(&self) -> f64 {
        self.volume_ml
    }

    /// Alcohol by volume, e.g. `5.0` for 5 %
    pub fn strength_percent(&self) -> f64 {
        self.strength_percent
    }

    /// Wall-clock instant the drink was consumed
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Grams of pure ethanol in the drink.
    pub fn alcohol_grams(&self) -> f64 {
        self.volume_ml * self.strength_percent / 100.0 * ETHANOL_DENSITY_G_PER_ML
    }
}

/// Binary category used to select the Widmark body-water ratio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    /// Widmark distribution ratio: 0.68 male-typical, 0.55 female-typical.
    pub fn widmark_factor(self) -> f64 {
        match self {
            Sex::Male => 0.68,
            Sex::Female => 0.55,
        }
    }
}

impl FromStr for Sex {
    type Err = BacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(BacError::UnknownSex(other.to_string())),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("male"),
            Sex::Female => f.write_str("female"),
        }
    }
}

/// Physiological parameters of the drinker.
///
/// The weight is guaranteed positive and finite, so the Widmark denominator
/// `weight_kg * widmark_factor` is never zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawUserProfile")]
pub struct UserProfile {
    weight_kg: f64,
    sex: Sex,
}

#[derive(Deserialize)]
struct RawUserProfile {
    weight_kg: f64,
    sex: Sex,
}

impl TryFrom<RawUserProfile> for UserProfile {
    type Error = BacError;

    fn try_from(raw: RawUserProfile) -> Result<Self, Self::Error> {
        UserProfile::new(raw.weight_kg, raw.sex)
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            weight_kg: 70.0,
            sex: Sex::Male,
        }
    }
}

impl UserProfile {
    pub fn new(weight_kg: f64, sex: Sex) -> Result<Self, BacError> {
        if !(weight_kg.is_finite() && weight_kg > 0.0) {
            return Err(BacError::InvalidWeight(weight_kg));
        }
        Ok(Self { weight_kg, sex })
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    /// The Widmark ratio selected by [`Sex`].
    pub fn body_water_constant(&self) -> f64 {
        self.sex.widmark_factor()
    }
}

/// BAC at a single instant of a timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineSample {
    pub time: DateTime<Utc>,
    /// Grams of alcohol per litre of blood, rounded to 3 decimals
    pub bac: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_drink_validation() {
        assert!(matches!(
            DrinkEvent::new("Beer", -250.0, 5.0, at()),
            Err(BacError::InvalidVolume(_))
        ));
        assert!(matches!(
            DrinkEvent::new("Beer", 250.0, 0.0, at()),
            Err(BacError::InvalidStrength(_))
        ));
        assert!(DrinkEvent::new("Beer", f64::NAN, 5.0, at()).is_err());
        assert!(DrinkEvent::new("Beer", 250.0, f64::INFINITY, at()).is_err());
    }

    #[test]
    fn test_profile_validation() {
        assert!(matches!(
            UserProfile::new(0.0, Sex::Male),
            Err(BacError::InvalidWeight(_))
        ));
        assert!(UserProfile::new(-70.0, Sex::Female).is_err());
        assert!(UserProfile::new(f64::NAN, Sex::Female).is_err());
        assert_eq!(UserProfile::new(70.0, Sex::Female).unwrap().body_water_constant(), 0.55);
        assert_eq!(UserProfile::default().body_water_constant(), 0.68);
    }

    #[test]
    fn test_sex_parsing() {
        assert_eq!("Male".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!(" f ".parse::<Sex>().unwrap(), Sex::Female);
        assert!(matches!("other".parse::<Sex>(), Err(BacError::UnknownSex(_))));
    }

    #[test]
    fn test_drink_ids_are_unique_and_parse_back() {
        let a = DrinkEvent::new("Beer", 250.0, 5.0, at()).unwrap();
        let b = DrinkEvent::new("Beer", 250.0, 5.0, at()).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string().parse::<DrinkId>().unwrap(), a.id());
    }

    #[test]
    fn test_deserialization_validates() {
        let json = format!(
            r#"{{"id":"{}","name":"Ghost","volume_ml":0.0,"strength_percent":5.0,"timestamp":"2025-07-24T20:00:00Z"}}"#,
            DrinkId::new()
        );
        assert!(serde_json::from_str::<DrinkEvent>(&json).is_err());

        let profile: UserProfile = serde_json::from_str(r#"{"weight_kg":64.0,"sex":"female"}"#).unwrap();
        assert_eq!(profile.weight_kg(), 64.0);
        assert!(serde_json::from_str::<UserProfile>(r#"{"weight_kg":-1.0,"sex":"male"}"#).is_err());
    }

    #[test]
    fn test_drink_keeps_id_through_json() {
        let drink = DrinkEvent::new("", 125.0, 12.0, at()).unwrap();
        assert_eq!(drink.name(), "Drink 12%");
        let json = serde_json::to_string(&drink).unwrap();
        let back: DrinkEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, drink);
    }
}
