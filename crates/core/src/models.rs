//! Shared domain models.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum occupancy for a single day.
pub const MAX_PERSONS_PER_DAY: u32 = 200;

/// Smallest party size accepted for a single reservation.
pub const MIN_PARTY_SIZE: u32 = 1;

/// Largest party size accepted for a single reservation.
pub const MAX_PARTY_SIZE: u32 = 20;

/// One of the four bookable performance days.
///
/// Serializes as the bare German label (e.g. `"Dienstag"`), matching
/// both the persisted ledger document and the API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    /// Tuesday performance.
    Dienstag,
    /// Wednesday performance.
    Mittwoch,
    /// Thursday performance.
    Donnerstag,
    /// Friday performance.
    Freitag,
}

impl Day {
    /// All bookable days in schedule order.
    pub const ALL: [Day; 4] = [Day::Dienstag, Day::Mittwoch, Day::Donnerstag, Day::Freitag];

    /// Parse a day label, returning `None` for anything outside the schedule.
    pub fn parse(label: &str) -> Option<Day> {
        match label {
            "Dienstag" => Some(Day::Dienstag),
            "Mittwoch" => Some(Day::Mittwoch),
            "Donnerstag" => Some(Day::Donnerstag),
            "Freitag" => Some(Day::Freitag),
            _ => None,
        }
    }

    /// The label used in persisted state and API payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Day::Dienstag => "Dienstag",
            Day::Mittwoch => "Mittwoch",
            Day::Donnerstag => "Donnerstag",
            Day::Freitag => "Freitag",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A confirmed booking. Immutable once created; the ledger is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Creation-time identifier, strictly increasing within a process.
    pub id: i64,
    /// Day the seats are reserved for.
    pub day: Day,
    /// Number of persons covered by this booking.
    pub person_count: u32,
    /// Contact address supplied by the guest, stored verbatim.
    pub email: String,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
}

/// The persisted reservation history plus derived per-day totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    /// All reservations in creation order. The source of truth.
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    /// Derived occupancy per day. A cache over `reservations`,
    /// rebuilt via [`Ledger::recompute`].
    #[serde(default = "zero_occupancy")]
    pub persons_by_day: BTreeMap<Day, u32>,
}

fn zero_occupancy() -> BTreeMap<Day, u32> {
    Day::ALL.iter().map(|day| (*day, 0)).collect()
}

impl Default for Ledger {
    fn default() -> Self {
        Self::empty()
    }
}

impl Ledger {
    /// A ledger with no reservations and all four days at zero occupancy.
    pub fn empty() -> Self {
        Self {
            reservations: Vec::new(),
            persons_by_day: zero_occupancy(),
        }
    }

    /// Occupancy currently recorded for the given day.
    pub fn persons_for(&self, day: Day) -> u32 {
        self.persons_by_day.get(&day).copied().unwrap_or(0)
    }

    /// Rebuild `persons_by_day` from the reservation list, zeroing any
    /// day without reservations. The totals are never trusted to have
    /// stayed consistent on their own.
    pub fn recompute(&mut self) {
        let mut totals = zero_occupancy();
        for reservation in &self.reservations {
            if let Some(total) = totals.get_mut(&reservation.day) {
                *total += reservation.person_count;
            }
        }
        self.persons_by_day = totals;
    }

    /// Availability summary for a single day, from the stored totals.
    pub fn day_status(&self, day: Day) -> DayStatus {
        let persons_for_day = self.persons_for(day);
        DayStatus {
            day,
            persons_for_day,
            max_persons: MAX_PERSONS_PER_DAY,
            available_persons: i64::from(MAX_PERSONS_PER_DAY) - i64::from(persons_for_day),
            is_full: persons_for_day >= MAX_PERSONS_PER_DAY,
        }
    }
}

/// Availability snapshot for one day, as reported by the status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStatus {
    /// The day being reported on.
    pub day: Day,
    /// Persons currently booked for the day.
    pub persons_for_day: u32,
    /// The per-day capacity cap.
    pub max_persons: u32,
    /// Remaining seats. Negative when a corrupted document holds a
    /// total above the cap, matching the stored-as-is reporting rule.
    pub available_persons: i64,
    /// Whether the day has reached or exceeded its cap.
    pub is_full: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reservation(id: i64, day: Day, person_count: u32) -> Reservation {
        Reservation {
            id,
            day,
            person_count,
            email: "gast@example.com".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_ledger_has_all_days_at_zero() {
        let ledger = Ledger::empty();
        assert!(ledger.reservations.is_empty());
        assert_eq!(ledger.persons_by_day.len(), 4);
        for day in Day::ALL {
            assert_eq!(ledger.persons_for(day), 0);
        }
    }

    #[test]
    fn recompute_repairs_drifted_totals() {
        let mut ledger = Ledger::empty();
        ledger.reservations.push(reservation(1, Day::Dienstag, 4));
        ledger.reservations.push(reservation(2, Day::Dienstag, 6));
        ledger.reservations.push(reservation(3, Day::Freitag, 2));
        ledger.persons_by_day.insert(Day::Dienstag, 99);
        ledger.persons_by_day.insert(Day::Mittwoch, 17);

        ledger.recompute();

        assert_eq!(ledger.persons_for(Day::Dienstag), 10);
        assert_eq!(ledger.persons_for(Day::Mittwoch), 0);
        assert_eq!(ledger.persons_for(Day::Donnerstag), 0);
        assert_eq!(ledger.persons_for(Day::Freitag), 2);
    }

    #[test]
    fn day_status_reflects_stored_totals() {
        let mut ledger = Ledger::empty();
        ledger.persons_by_day.insert(Day::Mittwoch, 200);
        ledger.persons_by_day.insert(Day::Dienstag, 5);

        let status = ledger.day_status(Day::Dienstag);
        assert_eq!(status.persons_for_day, 5);
        assert_eq!(status.available_persons, 195);
        assert!(!status.is_full);

        let full = ledger.day_status(Day::Mittwoch);
        assert_eq!(full.available_persons, 0);
        assert!(full.is_full);
    }

    #[test]
    fn day_status_reports_negative_availability_over_cap() {
        let mut ledger = Ledger::empty();
        ledger.persons_by_day.insert(Day::Freitag, 210);
        let status = ledger.day_status(Day::Freitag);
        assert_eq!(status.available_persons, -10);
        assert!(status.is_full);
    }

    #[test]
    fn parse_rejects_days_outside_the_schedule() {
        assert_eq!(Day::parse("Dienstag"), Some(Day::Dienstag));
        assert_eq!(Day::parse("Montag"), None);
        assert_eq!(Day::parse("dienstag"), None);
        assert_eq!(Day::parse(""), None);
    }

    #[test]
    fn ledger_serializes_with_camel_case_document_keys() {
        let mut ledger = Ledger::empty();
        ledger.reservations.push(reservation(7, Day::Donnerstag, 3));
        ledger.recompute();

        let value = serde_json::to_value(&ledger).expect("serialize ledger");
        assert!(value.get("personsByDay").is_some());
        assert_eq!(value["personsByDay"]["Donnerstag"], 3);
        let first = &value["reservations"][0];
        assert_eq!(first["personCount"], 3);
        assert_eq!(first["day"], "Donnerstag");
        assert!(first.get("timestamp").is_some());
    }
}
