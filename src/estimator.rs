//! # Point Estimator
//!
//! Computes the BAC at a single instant with a linearised Widmark model.
//!
//! ## Per-drink formula
//!
//! ```text
//! alcohol_g   = volume_ml * strength_percent / 100 * 0.789
//! peak_bac    = alcohol_g / (weight_kg * widmark_factor)
//! eliminated  = hours_since_drink * beta
//! contribution = max(0, peak_bac - eliminated)
//! ```
//!
//! Each drink is clamped on its own, so one drink that has fully cleared never
//! subtracts from another that has not. Drinks timestamped after the evaluation
//! instant are skipped entirely.
//!
//! ## Accuracy Trade-offs
//! - ✅ **Order of magnitude**: elimination of 0.15 g/L per hour is within the
//!   commonly cited 0.10–0.20 range
//! - ❌ **No absorption phase**: every drink peaks the instant it is logged
//! - ❌ **No food, tolerance or drink-specific curves**
//!
//! The result is guidance, not a measurement.

use crate::{DrinkEvent, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Elimination rate (β) in g/L per hour used by default.
pub const ELIMINATION_RATE: f64 = 0.15;

/// Historical elimination rate that implies ~33 hours to clear 0.5 g/L.
///
/// Kept only so the old behaviour can be reproduced and compared against.
pub const LEGACY_ELIMINATION_RATE: f64 = 0.015;

/// BAC at or above this is at least [`Status::Caution`]
pub const CAUTION_THRESHOLD: f64 = 0.25;

/// BAC at or above this is [`Status::Danger`]
pub const DANGER_THRESHOLD: f64 = 0.5;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Round a BAC value to 3 decimal places.
pub fn round_bac(bac: f64) -> f64 {
    (bac * 1000.0).round() / 1000.0
}

/// Safety classification of a BAC value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Safe,
    Caution,
    Danger,
}

impl Status {
    /// `< 0.25` safe, `[0.25, 0.5)` caution, `>= 0.5` danger.
    pub fn from_bac(bac: f64) -> Self {
        if bac < CAUTION_THRESHOLD {
            Status::Safe
        } else if bac < DANGER_THRESHOLD {
            Status::Caution
        } else {
            Status::Danger
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Safe => f.write_str("safe"),
            Status::Caution => f.write_str("caution"),
            Status::Danger => f.write_str("danger"),
        }
    }
}

/// Advisory shown for a given BAC and its status.
fn advisory(bac: f64, status: Status) -> &'static str {
    match status {
        Status::Safe if bac <= 0.0 => "You are sober!",
        Status::Safe => "You are under the legal limit, but stay careful.",
        Status::Caution => "You are approaching the legal limit. Wait before driving.",
        Status::Danger => "DO NOT DRIVE. You are above the legal limit. Call a taxi.",
    }
}

/// Point-in-time BAC result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BacEstimate {
    /// Grams of alcohol per litre of blood, rounded to 3 decimals, never negative
    pub bac: f64,
    pub status: Status,
    pub message: String,
    pub computed_at: DateTime<Utc>,
}

impl BacEstimate {
    fn from_bac(bac: f64, computed_at: DateTime<Utc>) -> Self {
        let status = Status::from_bac(bac);
        Self {
            bac,
            status,
            message: advisory(bac, status).to_string(),
            computed_at,
        }
    }

    /// True once nothing is left to eliminate.
    pub fn is_sober(&self) -> bool {
        self.bac <= 0.0
    }
}

/// Widmark model parameterised by its elimination rate.
///
/// # Example
/// ```
/// use bac_tracker_lib::{BacModel, DrinkEvent, Sex, Status, UserProfile};
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 7, 24, 20, 0, 0).unwrap();
/// let profile = UserProfile::new(70.0, Sex::Male).unwrap();
/// let beer = DrinkEvent::new("Beer", 250.0, 5.0, at).unwrap();
///
/// let estimate = BacModel::default().estimate(&[beer], &profile, at);
/// assert_eq!(estimate.bac, 0.207);
/// assert_eq!(estimate.status, Status::Safe);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BacModel {
    /// β in g/L per hour
    pub elimination_rate: f64,
}

impl Default for BacModel {
    fn default() -> Self {
        Self {
            elimination_rate: ELIMINATION_RATE,
        }
    }
}

impl BacModel {
    pub fn new(elimination_rate: f64) -> Self {
        Self { elimination_rate }
    }

    /// BAC left over from a single drink at instant `at`, unrounded.
    ///
    /// Zero if the drink is later than `at` or has been fully eliminated.
    pub fn contribution(&self, drink: &DrinkEvent, profile: &UserProfile, at: DateTime<Utc>) -> f64 {
        if drink.timestamp() > at {
            return 0.0;
        }

        // Millisecond resolution keeps sub-minute offsets meaningful
        let hours_elapsed =
            (at - drink.timestamp()).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR;

        let peak_bac = drink.alcohol_grams() / (profile.weight_kg() * profile.body_water_constant());
        let eliminated = hours_elapsed * self.elimination_rate;

        (peak_bac - eliminated).max(0.0)
    }

    /// Total BAC at instant `at`, rounded to 3 decimals.
    pub fn bac_at(&self, drinks: &[DrinkEvent], profile: &UserProfile, at: DateTime<Utc>) -> f64 {
        let total: f64 = drinks
            .iter()
            .map(|drink| self.contribution(drink, profile, at))
            .sum();
        round_bac(total)
    }

    /// Current BAC with status and advisory message.
    pub fn estimate(&self, drinks: &[DrinkEvent], profile: &UserProfile, now: DateTime<Utc>) -> BacEstimate {
        BacEstimate::from_bac(self.bac_at(drinks, profile, now), now)
    }
}

/// Estimate BAC at `now` with the default elimination rate.
pub fn estimate_bac(drinks: &[DrinkEvent], profile: &UserProfile, now: DateTime<Utc>) -> BacEstimate {
    BacModel::default().estimate(drinks, profile, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sex;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 20, 0, 0).unwrap()
    }

    fn male_70() -> UserProfile {
        UserProfile::new(70.0, Sex::Male).unwrap()
    }

    fn beer_at(at: DateTime<Utc>) -> DrinkEvent {
        DrinkEvent::new("Beer", 250.0, 5.0, at).unwrap()
    }

    #[test]
    fn test_single_beer_peak() {
        // 9.8625 g / (70 * 0.68) = 0.20719...
        let estimate = estimate_bac(&[beer_at(t0())], &male_70(), t0());
        assert_eq!(estimate.bac, 0.207);
        assert_eq!(estimate.status, Status::Safe);
        assert_eq!(estimate.computed_at, t0());
    }

    #[test]
    fn test_single_beer_after_one_hour() {
        let drinks = [beer_at(t0())];
        let later = t0() + Duration::hours(1);

        // 0.20719 - 0.15 = 0.05719
        assert_eq!(estimate_bac(&drinks, &male_70(), later).bac, 0.057);

        // 0.20719 - 0.015 = 0.19219
        let legacy = BacModel::new(LEGACY_ELIMINATION_RATE);
        assert_eq!(legacy.estimate(&drinks, &male_70(), later).bac, 0.192);
    }

    #[test]
    fn test_single_beer_fully_eliminated() {
        let drinks = [beer_at(t0())];
        let estimate = estimate_bac(&drinks, &male_70(), t0() + Duration::hours(2));
        assert_eq!(estimate.bac, 0.0);
        assert!(estimate.is_sober());
        assert_eq!(estimate.message, "You are sober!");
    }

    #[test]
    fn test_empty_log_is_sober() {
        let estimate = estimate_bac(&[], &male_70(), t0());
        assert_eq!(estimate.bac, 0.0);
        assert_eq!(estimate.status, Status::Safe);
        assert!(estimate.is_sober());
    }

    #[test]
    fn test_future_drink_is_excluded() {
        let huge = DrinkEvent::new("Vodka", 1000.0, 40.0, t0() + Duration::seconds(1)).unwrap();
        let estimate = estimate_bac(&[huge], &male_70(), t0());
        assert_eq!(estimate.bac, 0.0);
    }

    #[test]
    fn test_drinks_do_not_offset_each_other() {
        // An old drink that cleared long ago must not pull a fresh one down
        let old = beer_at(t0() - Duration::hours(10));
        let fresh = beer_at(t0());
        let estimate = estimate_bac(&[old, fresh.clone()], &male_70(), t0());
        let alone = estimate_bac(&[fresh], &male_70(), t0());
        assert_eq!(estimate.bac, alone.bac);
    }

    #[test]
    fn test_female_factor_raises_bac() {
        let female = UserProfile::new(70.0, Sex::Female).unwrap();
        let drinks = [beer_at(t0())];
        // 9.8625 / (70 * 0.55) = 0.25617...
        let estimate = estimate_bac(&drinks, &female, t0());
        assert_eq!(estimate.bac, 0.256);
        assert_eq!(estimate.status, Status::Caution);
    }

    #[test]
    fn test_sub_minute_precision() {
        let drinks = [beer_at(t0())];
        let model = BacModel::default();
        let profile = male_70();
        let at = t0() + Duration::seconds(30);
        let contribution = model.contribution(&drinks[0], &profile, at);
        let peak = model.contribution(&drinks[0], &profile, t0());
        // 30 s at 0.15/h removes 0.00125
        assert!((peak - contribution - 0.00125).abs() < 1e-9);
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(Status::from_bac(0.0), Status::Safe);
        assert_eq!(Status::from_bac(0.249999), Status::Safe);
        assert_eq!(Status::from_bac(0.25), Status::Caution);
        assert_eq!(Status::from_bac(0.499), Status::Caution);
        assert_eq!(Status::from_bac(0.5), Status::Danger);
        assert_eq!(Status::from_bac(2.0), Status::Danger);
    }

    #[test]
    fn test_messages_follow_status() {
        assert_eq!(advisory(0.1, Status::Safe), "You are under the legal limit, but stay careful.");
        assert!(advisory(0.3, Status::Caution).contains("approaching"));
        assert!(advisory(0.8, Status::Danger).starts_with("DO NOT DRIVE"));
    }

    #[test]
    fn test_round_bac() {
        assert_eq!(round_bac(0.20719), 0.207);
        assert_eq!(round_bac(0.0576), 0.058);
        assert_eq!(round_bac(0.0), 0.0);
    }
}
