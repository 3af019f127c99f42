//! # Drink Log Persistence
//!
//! The estimator is pure; this module is the state that surrounds it. A
//! [`DrinkLog`] holds the user's profile, the drinks currently being tracked and a
//! list of previously entered drinks for quick reuse, and is stored as a single
//! JSON document.
//!
//! ## Storage
//! - **Format**: pretty-printed JSON, one document per user
//! - **Missing file**: treated as an empty log with the default profile
//! - **Corrupt file**: reported as [`BacError::Parse`] rather than silently discarded,
//!   since the log is user data and not a cache
//!
//! ## Housekeeping Policies
//! Both policies belong to the caller and run in [`DrinkLog::refresh`]:
//! - **Pruning**: drinks older than 24 hours are dropped
//! - **Auto-clear**: once the estimate reaches zero the tracked drinks are cleared
//!
//! Saved drinks survive both policies; only [`DrinkLog::reset`] removes them.

use crate::{
    BacError, BacEstimate, BacModel, BacTimeline, DrinkEvent, DrinkId, TimelineWindow, UserProfile,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use tracing::{debug, info};

/// Default drink log file name
pub const DEFAULT_LOG_FILE: &str = "drinks.json";

/// Drinks older than this are pruned on refresh
pub const MAX_DRINK_AGE_HOURS: i64 = 24;

/// A preset used to pre-fill a new entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StandardDrink {
    pub id: &'static str,
    pub label: &'static str,
    pub volume_ml: f64,
    pub strength_percent: f64,
}

/// Common serving sizes; volumes and strengths are approximate.
pub const STANDARD_DRINKS: [StandardDrink; 5] = [
    StandardDrink {
        id: "beer",
        label: "Beer",
        volume_ml: 250.0,
        strength_percent: 5.0,
    },
    StandardDrink {
        id: "wine",
        label: "Wine",
        volume_ml: 125.0,
        strength_percent: 12.0,
    },
    StandardDrink {
        id: "shot",
        label: "Shot",
        volume_ml: 25.0,
        strength_percent: 40.0,
    },
    StandardDrink {
        id: "cocktail",
        label: "Cocktail",
        volume_ml: 200.0,
        strength_percent: 12.0,
    },
    StandardDrink {
        id: "pastis",
        label: "Pastis",
        volume_ml: 25.0,
        strength_percent: 45.0,
    },
];

/// Look up a preset by id (case-insensitive).
pub fn standard_drink(id: &str) -> Option<&'static StandardDrink> {
    STANDARD_DRINKS
        .iter()
        .find(|drink| drink.id.eq_ignore_ascii_case(id))
}

impl StandardDrink {
    pub fn to_event(&self, timestamp: DateTime<Utc>) -> Result<DrinkEvent, BacError> {
        DrinkEvent::new(self.label, self.volume_ml, self.strength_percent, timestamp)
    }
}

/// A previously entered drink kept for one-tap reuse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedDrink {
    pub id: DrinkId,
    pub name: String,
    pub volume_ml: f64,
    pub strength_percent: f64,
}

impl SavedDrink {
    fn from_event(event: &DrinkEvent) -> Self {
        Self {
            id: DrinkId::new(),
            name: event.name().to_string(),
            volume_ml: event.volume_ml(),
            strength_percent: event.strength_percent(),
        }
    }

    fn matches(&self, event: &DrinkEvent) -> bool {
        self.name == event.name()
            && self.volume_ml == event.volume_ml()
            && self.strength_percent == event.strength_percent()
    }

    /// Log this drink again at `timestamp`.
    pub fn to_event(&self, timestamp: DateTime<Utc>) -> Result<DrinkEvent, BacError> {
        DrinkEvent::new(&self.name, self.volume_ml, self.strength_percent, timestamp)
    }
}

/// Profile, tracked drinks and saved drinks for one user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrinkLog {
    #[serde(default)]
    pub profile: UserProfile,
    /// Drinks in the order they were logged
    #[serde(default)]
    pub drinks: Vec<DrinkEvent>,
    #[serde(default)]
    pub saved_drinks: Vec<SavedDrink>,
}

impl DrinkLog {
    /// Load a log from `path`, or start an empty one if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BacError> {
        let path = path.as_ref();
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no drink log found, starting empty");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let log: DrinkLog = serde_json::from_slice(&data)?;
        debug!(
            path = %path.display(),
            drinks = log.drinks.len(),
            saved = log.saved_drinks.len(),
            "loaded drink log"
        );
        Ok(log)
    }

    /// Write the log to `path`, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), BacError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        debug!(path = %path.display(), drinks = self.drinks.len(), "saved drink log");
        Ok(())
    }

    /// Track a new drink and remember it for reuse unless an identical one is saved.
    pub fn add_drink(&mut self, event: DrinkEvent) {
        if !self.saved_drinks.iter().any(|saved| saved.matches(&event)) {
            self.saved_drinks.push(SavedDrink::from_event(&event));
        }
        info!(id = %event.id(), name = event.name(), at = %event.timestamp(), "drink added");
        self.drinks.push(event);
    }

    /// Remove a tracked drink. Returns whether it was present.
    pub fn remove_drink(&mut self, id: DrinkId) -> bool {
        let before = self.drinks.len();
        self.drinks.retain(|drink| drink.id() != id);
        before != self.drinks.len()
    }

    /// Remove a saved drink. Returns whether it was present.
    pub fn remove_saved_drink(&mut self, id: DrinkId) -> bool {
        let before = self.saved_drinks.len();
        self.saved_drinks.retain(|drink| drink.id != id);
        before != self.saved_drinks.len()
    }

    /// Most recently logged drink.
    pub fn last_drink(&self) -> Option<&DrinkEvent> {
        self.drinks.last()
    }

    /// Drop drinks consumed more than `max_age` before `now`. Returns how many went.
    pub fn prune_older_than(&mut self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let cutoff = now - max_age;
        let before = self.drinks.len();
        self.drinks.retain(|drink| drink.timestamp() >= cutoff);
        let pruned = before - self.drinks.len();
        if pruned > 0 {
            debug!(pruned, "pruned stale drinks");
        }
        pruned
    }

    /// Clear tracked drinks once `estimate` shows nothing left. Returns whether it cleared.
    pub fn clear_if_sober(&mut self, estimate: &BacEstimate) -> bool {
        if !estimate.is_sober() || self.drinks.is_empty() {
            return false;
        }
        info!(count = self.drinks.len(), "BAC back to zero, clearing drink log");
        self.drinks.clear();
        true
    }

    /// Forget everything, including saved drinks and the profile.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn estimate(&self, model: &BacModel, now: DateTime<Utc>) -> BacEstimate {
        model.estimate(&self.drinks, &self.profile, now)
    }

    pub fn timeline(&self, model: &BacModel, now: DateTime<Utc>, window: &TimelineWindow) -> BacTimeline {
        model.timeline(&self.drinks, &self.profile, now, window)
    }

    /// Prune, estimate, then apply the auto-clear policy.
    ///
    /// The log is not cleared while it holds a drink logged for a time after `now`:
    /// a near-future entry adds nothing yet but must survive until it counts. The
    /// returned estimate is the one computed before clearing.
    pub fn refresh(&mut self, model: &BacModel, now: DateTime<Utc>) -> BacEstimate {
        self.prune_older_than(now, Duration::hours(MAX_DRINK_AGE_HOURS));
        let estimate = self.estimate(model, now);
        if self.drinks.iter().any(|drink| drink.timestamp() > now) {
            debug!("upcoming drink in the log, skipping auto-clear");
        } else {
            self.clear_if_sober(&estimate);
        }
        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sex;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 23, 0, 0).unwrap()
    }

    fn beer(at: DateTime<Utc>) -> DrinkEvent {
        standard_drink("beer").unwrap().to_event(at).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty_log() {
        let dir = TempDir::new().unwrap();
        let log = DrinkLog::load(dir.path().join("absent.json")).unwrap();
        assert!(log.drinks.is_empty());
        assert_eq!(log.profile, UserProfile::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_LOG_FILE);

        let mut log = DrinkLog {
            profile: UserProfile::new(82.5, Sex::Female).unwrap(),
            ..Default::default()
        };
        log.add_drink(beer(now()));
        log.save(&path).unwrap();

        let loaded = DrinkLog::load(&path).unwrap();
        assert_eq!(loaded, log);
        assert_eq!(loaded.drinks[0].id(), log.drinks[0].id());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_LOG_FILE);
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(DrinkLog::load(&path), Err(BacError::Parse(_))));
    }

    #[test]
    fn test_invalid_stored_weight_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_LOG_FILE);
        fs::write(&path, br#"{"profile":{"weight_kg":0.0,"sex":"male"}}"#).unwrap();
        assert!(DrinkLog::load(&path).is_err());
    }

    #[test]
    fn test_saved_drinks_are_deduplicated() {
        let mut log = DrinkLog::default();
        log.add_drink(beer(now() - Duration::hours(1)));
        log.add_drink(beer(now()));
        log.add_drink(standard_drink("wine").unwrap().to_event(now()).unwrap());

        assert_eq!(log.drinks.len(), 3);
        assert_eq!(log.saved_drinks.len(), 2);
        assert_eq!(log.saved_drinks[0].name, "Beer");
    }

    #[test]
    fn test_remove_drink_and_saved_drink() {
        let mut log = DrinkLog::default();
        log.add_drink(beer(now()));
        let id = log.drinks[0].id();
        let saved_id = log.saved_drinks[0].id;

        assert!(log.remove_drink(id));
        assert!(!log.remove_drink(id));
        assert!(log.drinks.is_empty());

        assert!(log.remove_saved_drink(saved_id));
        assert!(log.saved_drinks.is_empty());
    }

    #[test]
    fn test_prune_older_than_a_day() {
        let mut log = DrinkLog::default();
        log.add_drink(beer(now() - Duration::hours(30)));
        log.add_drink(beer(now() - Duration::hours(2)));

        let pruned = log.prune_older_than(now(), Duration::hours(MAX_DRINK_AGE_HOURS));
        assert_eq!(pruned, 1);
        assert_eq!(log.drinks.len(), 1);
    }

    #[test]
    fn test_refresh_clears_when_sober() {
        let mut log = DrinkLog::default();
        log.add_drink(beer(now() - Duration::hours(3)));

        let estimate = log.refresh(&BacModel::default(), now());
        assert!(estimate.is_sober());
        assert!(log.drinks.is_empty());
        // Saved drinks outlive the auto-clear
        assert_eq!(log.saved_drinks.len(), 1);
    }

    #[test]
    fn test_refresh_keeps_upcoming_drink() {
        let mut log = DrinkLog::default();
        log.add_drink(beer(now() + Duration::minutes(45)));

        let estimate = log.refresh(&BacModel::default(), now());
        assert!(estimate.is_sober());
        assert_eq!(log.drinks.len(), 1, "a drink logged for later must not be cleared");

        // Once it has been drunk and eliminated the log clears as usual
        let estimate = log.refresh(&BacModel::default(), now() + Duration::hours(4));
        assert!(estimate.is_sober());
        assert!(log.drinks.is_empty());
    }

    #[test]
    fn test_refresh_keeps_drinks_while_over_zero() {
        let mut log = DrinkLog::default();
        log.add_drink(beer(now() - Duration::minutes(30)));

        let estimate = log.refresh(&BacModel::default(), now());
        assert!(estimate.bac > 0.0);
        assert_eq!(log.drinks.len(), 1);
    }

    #[test]
    fn test_saved_drink_reuse() {
        let mut log = DrinkLog::default();
        log.add_drink(DrinkEvent::new("", 330.0, 8.0, now()).unwrap());
        let saved = log.saved_drinks[0].clone();
        assert_eq!(saved.name, "Drink 8%");

        let again = saved.to_event(now() + Duration::minutes(30)).unwrap();
        assert_eq!(again.volume_ml(), 330.0);
        assert_ne!(again.id(), log.drinks[0].id());
    }

    #[test]
    fn test_reset() {
        let mut log = DrinkLog {
            profile: UserProfile::new(60.0, Sex::Female).unwrap(),
            ..Default::default()
        };
        log.add_drink(beer(now()));
        log.reset();
        assert_eq!(log, DrinkLog::default());
    }

    #[test]
    fn test_standard_drink_lookup() {
        assert_eq!(standard_drink("SHOT").unwrap().strength_percent, 40.0);
        assert!(standard_drink("absinthe").is_none());
    }
}
