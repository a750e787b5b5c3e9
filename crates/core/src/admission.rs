//! Admission control for incoming reservation requests.

use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    ledger::LedgerStore,
    models::{
        Day, DayStatus, Ledger, Reservation, MAX_PARTY_SIZE, MAX_PERSONS_PER_DAY, MIN_PARTY_SIZE,
    },
};

/// Rejection reasons for a reservation request.
///
/// Every variant is a business-rule failure answered to the client as a
/// structured response; none of them indicates an internal fault. The
/// display strings are the client-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// A required field was absent, empty, or zero.
    #[error("Tag, Personenanzahl und E-Mail sind erforderlich")]
    MissingFields,
    /// The party size fell outside the accepted bounds.
    #[error("Personenanzahl muss zwischen 1 und 20 liegen")]
    InvalidPersonCount,
    /// The requested day is not part of the schedule.
    #[error("Ungültiger Tag ausgewählt")]
    InvalidDay,
    /// The day already sits at or above its capacity cap.
    #[error("Alle Plätze für {0} sind bereits reserviert")]
    DayFull(Day),
    /// The request would push the day over its cap.
    #[error("Nur noch {available} Plätze für {day} verfügbar")]
    CapacityExceeded {
        /// The day that lacks room.
        day: Day,
        /// Seats still available for that day.
        available: u32,
    },
}

/// Incoming reservation payload, prior to any validation.
///
/// Fields are optional so that absence is decided by the presence rule
/// rather than by deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    /// Requested day label, not yet checked against the schedule.
    #[serde(default)]
    pub day: Option<String>,
    /// Requested party size.
    #[serde(default)]
    pub person_count: Option<i64>,
    /// Contact address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Successful admission outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReceipt {
    /// Updated occupancy for the booked day.
    pub persons_for_day: u32,
    /// Seats remaining for the booked day.
    pub available_persons: i64,
    /// The newly created reservation.
    pub reservation: Reservation,
}

/// Response payload for the status query.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StatusView {
    /// Availability for one specific day.
    Day(DayStatus),
    /// The full ledger, returned when no valid day label was given.
    Ledger(Ledger),
}

/// Applies the booking rules against the ledger store.
///
/// Admissions run inside a single-writer critical section, so within
/// one process two concurrent requests cannot both pass the capacity
/// checks against the same stale snapshot.
pub struct AdmissionController {
    store: Arc<dyn LedgerStore>,
    ids: IdGenerator,
    write_lock: Mutex<()>,
}

impl AdmissionController {
    /// Create a controller over the given store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            ids: IdGenerator::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Availability for `day`, or the full ledger when the label is
    /// absent or unknown.
    ///
    /// Reads report the stored totals as-is; only admissions recompute.
    pub fn status(&self, day: Option<&str>) -> StatusView {
        let ledger = self.store.load();
        match day.and_then(Day::parse) {
            Some(day) => StatusView::Day(ledger.day_status(day)),
            None => StatusView::Ledger(ledger),
        }
    }

    /// The full ledger, unfiltered, for administrative consumers.
    pub fn all(&self) -> Ledger {
        self.store.load()
    }

    /// Stored per-day occupancy totals.
    pub fn counts(&self) -> BTreeMap<Day, u32> {
        self.store.load().persons_by_day
    }

    /// Validate `request` and, when admitted, append it to the ledger
    /// and persist the updated state.
    ///
    /// Rules run in order and the first failure wins; a rejected
    /// request leaves no trace in the store. The occupancy totals are
    /// recomputed from the reservation list before the capacity checks,
    /// so a drifted or hand-edited document heals itself here.
    pub fn add_reservation(
        &self,
        request: &ReservationRequest,
    ) -> Result<AdmissionReceipt, AdmissionError> {
        let day_label = match request.day.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => return Err(AdmissionError::MissingFields),
        };
        let email = match request.email.as_deref() {
            Some(email) if !email.is_empty() => email,
            _ => return Err(AdmissionError::MissingFields),
        };
        // A zero count is treated as missing, not as out of range.
        let person_count = match request.person_count {
            None | Some(0) => return Err(AdmissionError::MissingFields),
            Some(count) => count,
        };
        if !(i64::from(MIN_PARTY_SIZE)..=i64::from(MAX_PARTY_SIZE)).contains(&person_count) {
            return Err(AdmissionError::InvalidPersonCount);
        }
        let person_count = person_count as u32;
        let day = Day::parse(day_label).ok_or(AdmissionError::InvalidDay)?;

        let _guard = self.write_lock.lock();
        let mut ledger = self.store.load();
        ledger.recompute();

        let current = ledger.persons_for(day);
        if current >= MAX_PERSONS_PER_DAY {
            return Err(AdmissionError::DayFull(day));
        }
        if current + person_count > MAX_PERSONS_PER_DAY {
            return Err(AdmissionError::CapacityExceeded {
                day,
                available: MAX_PERSONS_PER_DAY - current,
            });
        }

        let reservation = Reservation {
            id: self.ids.next(),
            day,
            person_count,
            email: email.to_string(),
            timestamp: Utc::now(),
        };
        ledger.reservations.push(reservation.clone());
        *ledger.persons_by_day.entry(day).or_insert(0) += person_count;

        if let Err(err) = self.store.save(&ledger) {
            warn!(
                "reservation {} admitted but not durably saved: {err:#}",
                reservation.id
            );
        }

        let persons_for_day = ledger.persons_for(day);
        info!(
            "admitted reservation {} for {day}: {person_count} persons, {persons_for_day} total",
            reservation.id
        );
        Ok(AdmissionReceipt {
            persons_for_day,
            available_persons: i64::from(MAX_PERSONS_PER_DAY) - i64::from(persons_for_day),
            reservation,
        })
    }
}

/// Issues time-derived identifiers that are strictly increasing within
/// the process, even for calls landing in the same millisecond.
#[derive(Debug, Default)]
struct IdGenerator {
    last: Mutex<i64>,
}

impl IdGenerator {
    fn next(&self) -> i64 {
        let mut last = self.last.lock();
        let id = Utc::now().timestamp_millis().max(*last + 1);
        *last = id;
        id
    }
}
