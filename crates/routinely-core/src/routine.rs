//! Routine model types.
//!
//! A routine is a user-defined habit with a weekly schedule and one of
//! three interaction kinds: a binary toggle, a bounded counter, or a
//! bounded timer. Routines are created and edited by an external editor
//! collaborator; deletion is permanent (no soft delete).

use chrono::{DateTime, Utc, Weekday};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Unique routine identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutineId(Uuid);

impl RoutineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RoutineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoutineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Interaction kind of a routine, with the kind-specific target.
///
/// Targets are validated to be at least 1 by the [`Routine`] constructors,
/// so a counter or timer routine always has a reachable completion bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutineKind {
    /// Binary done/not-done.
    Toggle,
    /// Bounded integer progress toward `target_count`.
    Counter { target_count: u32 },
    /// Bounded elapsed-time progress toward `target_duration_secs`.
    Timer { target_duration_secs: u32 },
}

impl RoutineKind {
    pub fn name(&self) -> &'static str {
        match self {
            RoutineKind::Toggle => "toggle",
            RoutineKind::Counter { .. } => "counter",
            RoutineKind::Timer { .. } => "timer",
        }
    }
}

/// Set of scheduled weekdays, stored as a bitmask (bit 0 = Monday).
///
/// Serialized as a list of ISO weekday numbers (1 = Monday .. 7 = Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// Every day of the week.
    pub const ALL: WeekdaySet = WeekdaySet(0b0111_1111);

    pub fn empty() -> Self {
        WeekdaySet(0)
    }

    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = Self::empty();
        for day in days {
            set.insert(*day);
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.iter().copied().filter(|d| self.contains(*d))
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let numbers: Vec<u8> = self.iter().map(|d| d.number_from_monday() as u8).collect();
        numbers.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let numbers = Vec::<u8>::deserialize(deserializer)?;
        let mut set = WeekdaySet::empty();
        for n in numbers {
            let day = WEEK
                .get(n.wrapping_sub(1) as usize)
                .copied()
                .ok_or_else(|| D::Error::custom(format!("weekday number out of range: {n}")))?;
            set.insert(day);
        }
        Ok(set)
    }
}

/// A user-defined habit/routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: RoutineId,
    pub title: String,
    /// Weekdays on which the routine is scheduled.
    pub schedule: WeekdaySet,
    #[serde(flatten)]
    pub kind: RoutineKind,
    pub active: bool,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

impl Routine {
    /// Create a toggle routine scheduled every day.
    pub fn toggle(title: impl Into<String>) -> Self {
        Self {
            id: RoutineId::new(),
            title: title.into(),
            schedule: WeekdaySet::ALL,
            kind: RoutineKind::Toggle,
            active: true,
            pinned: false,
            created_at: Utc::now(),
        }
    }

    /// Create a counter routine. The target must be at least 1.
    pub fn counter(title: impl Into<String>, target_count: u32) -> Result<Self, CoreError> {
        if target_count == 0 {
            return Err(CoreError::InvalidRoutine(
                "counter target must be at least 1".into(),
            ));
        }
        Ok(Self {
            kind: RoutineKind::Counter { target_count },
            ..Self::toggle(title)
        })
    }

    /// Create a timer routine. The target duration must be at least 1 second.
    pub fn timer(title: impl Into<String>, target_duration_secs: u32) -> Result<Self, CoreError> {
        if target_duration_secs == 0 {
            return Err(CoreError::InvalidRoutine(
                "timer target must be at least 1 second".into(),
            ));
        }
        Ok(Self {
            kind: RoutineKind::Timer {
                target_duration_secs,
            },
            ..Self::toggle(title)
        })
    }

    pub fn target_count(&self) -> Option<u32> {
        match self.kind {
            RoutineKind::Counter { target_count } => Some(target_count),
            _ => None,
        }
    }

    pub fn target_duration_secs(&self) -> Option<u32> {
        match self.kind {
            RoutineKind::Timer {
                target_duration_secs,
            } => Some(target_duration_secs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_set_roundtrip() {
        let set = WeekdaySet::from_days(&[Weekday::Mon, Weekday::Wed, Weekday::Sun]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[1,3,7]");
        let decoded: WeekdaySet = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn weekday_set_rejects_out_of_range() {
        assert!(serde_json::from_str::<WeekdaySet>("[0]").is_err());
        assert!(serde_json::from_str::<WeekdaySet>("[8]").is_err());
    }

    #[test]
    fn counter_target_must_be_positive() {
        assert!(Routine::counter("Water", 0).is_err());
        let routine = Routine::counter("Water", 8).unwrap();
        assert_eq!(routine.target_count(), Some(8));
    }

    #[test]
    fn timer_target_must_be_positive() {
        assert!(Routine::timer("Stretch", 0).is_err());
        let routine = Routine::timer("Stretch", 300).unwrap();
        assert_eq!(routine.target_duration_secs(), Some(300));
    }

    #[test]
    fn routine_serialization() {
        let routine = Routine::counter("Water", 8).unwrap();
        let json = serde_json::to_string(&routine).unwrap();
        let decoded: Routine = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, routine);
    }
}
