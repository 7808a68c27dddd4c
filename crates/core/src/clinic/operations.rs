//! Pure scheduling and bookkeeping rules.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use super::error::{TransitionError, ValidationError};
use super::types::{AppointmentStatus, ChatStatus, RatingSummary, Slot};

/// Accepted `<input type="time">` formats.
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Parses a `YYYY-MM-DD` form value.
pub fn parse_form_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Parses an `HH:MM` (or `HH:MM:SS`) form value.
pub fn parse_form_time(value: &str) -> Result<NaiveTime, ValidationError> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
        .ok_or_else(|| ValidationError::InvalidTime(value.to_string()))
}

/// Formats a time the way forms and JSON expose it.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// A slot can be booked only if it starts strictly after `now`.
///
/// Whether an active appointment already holds it is decided by storage.
pub fn is_slot_bookable(slot: &Slot, now: NaiveDateTime) -> bool {
    slot.starts_at() > now
}

/// Sorted, de-duplicated dates that still have at least one bookable slot.
pub fn available_dates(slots: &[Slot], now: NaiveDateTime) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = slots
        .iter()
        .filter(|slot| is_slot_bookable(slot, now))
        .map(|slot| slot.date)
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Bookable slots on `date`, ordered by start time.
pub fn bookable_slots_on(slots: &[Slot], date: NaiveDate, now: NaiveDateTime) -> Vec<&Slot> {
    let mut on_date: Vec<&Slot> = slots
        .iter()
        .filter(|slot| slot.date == date && is_slot_bookable(slot, now))
        .collect();
    on_date.sort_by_key(|slot| slot.start_time);
    on_date
}

/// Half-open interval overlap: touching slots (09:00-09:30, 09:30-10:00) do not overlap.
pub fn times_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Returns the first existing slot on `date` that overlaps the proposed range.
pub fn find_overlapping_slot<'a>(
    existing: &'a [Slot],
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> Option<&'a Slot> {
    existing
        .iter()
        .find(|slot| slot.date == date && times_overlap(slot.start_time, slot.end_time, start, end))
}

/// Validates an appointment status change.
pub fn check_appointment_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), TransitionError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionError {
            entity: "appointment",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Validates a chat status change.
pub fn check_chat_transition(from: ChatStatus, to: ChatStatus) -> Result<(), TransitionError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionError {
            entity: "chat",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

impl RatingSummary {
    /// Builds a summary from the score total and count, rounding to one decimal.
    pub fn from_totals(total: u32, count: u32) -> Self {
        let average = (count > 0).then(|| {
            let raw = f64::from(total) / f64::from(count);
            (raw * 10.0).round() / 10.0
        });
        Self { average, count }
    }

    /// Human readable form, e.g. `4.5 / 5 (12 ratings)`.
    pub fn label(&self) -> String {
        match (self.average, self.count) {
            (Some(avg), 1) => format!("{avg:.1} / 5 (1 rating)"),
            (Some(avg), count) => format!("{avg:.1} / 5 ({count} ratings)"),
            (None, _) => "No ratings yet".to_string(),
        }
    }
}

/// Age in whole years on `today`.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn slot(day: &str, start: &str, end: &str) -> Slot {
        Slot::new(Uuid::nil(), date(day), time(start), time(end))
    }

    #[test]
    fn parses_form_dates_and_times() {
        assert_eq!(parse_form_date(" 2026-03-01 ").unwrap(), date("2026-03-01"));
        assert_eq!(parse_form_time("09:30").unwrap(), time("09:30"));
        assert_eq!(parse_form_time("09:30:00").unwrap(), time("09:30"));

        assert_eq!(
            parse_form_date("01/03/2026"),
            Err(ValidationError::InvalidDate("01/03/2026".to_string()))
        );
        assert!(parse_form_time("25:00").is_err());
        assert!(parse_form_time("").is_err());
    }

    #[test]
    fn slots_starting_now_or_earlier_are_not_bookable() {
        let now = date("2026-03-01").and_time(time("10:00"));
        assert!(!is_slot_bookable(&slot("2026-03-01", "09:00", "09:30"), now));
        assert!(!is_slot_bookable(&slot("2026-03-01", "10:00", "10:30"), now));
        assert!(is_slot_bookable(&slot("2026-03-01", "10:30", "11:00"), now));
        assert!(is_slot_bookable(&slot("2026-03-02", "08:00", "08:30"), now));
    }

    #[test]
    fn available_dates_are_sorted_unique_and_in_the_future() {
        let now = date("2026-03-01").and_time(time("12:00"));
        let slots = vec![
            slot("2026-03-03", "09:00", "09:30"),
            slot("2026-03-01", "09:00", "09:30"),
            slot("2026-03-02", "10:00", "10:30"),
            slot("2026-03-02", "09:00", "09:30"),
            slot("2026-03-01", "15:00", "15:30"),
        ];

        assert_eq!(
            available_dates(&slots, now),
            vec![date("2026-03-01"), date("2026-03-02"), date("2026-03-03")]
        );
    }

    #[test]
    fn bookable_slots_on_filters_by_date_and_orders_by_start() {
        let now = date("2026-03-01").and_time(time("08:00"));
        let slots = vec![
            slot("2026-03-02", "11:00", "11:30"),
            slot("2026-03-02", "09:00", "09:30"),
            slot("2026-03-03", "09:00", "09:30"),
        ];

        let on_date = bookable_slots_on(&slots, date("2026-03-02"), now);
        let starts: Vec<NaiveTime> = on_date.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![time("09:00"), time("11:00")]);
    }

    #[test]
    fn touching_slots_do_not_overlap() {
        assert!(!times_overlap(time("09:00"), time("09:30"), time("09:30"), time("10:00")));
        assert!(times_overlap(time("09:00"), time("10:00"), time("09:30"), time("10:30")));
        assert!(times_overlap(time("09:00"), time("12:00"), time("10:00"), time("11:00")));
    }

    #[test]
    fn find_overlapping_slot_only_looks_at_the_same_date() {
        let existing = vec![slot("2026-03-02", "09:00", "10:00")];
        assert!(
            find_overlapping_slot(&existing, date("2026-03-03"), time("09:00"), time("10:00"))
                .is_none()
        );
        assert!(
            find_overlapping_slot(&existing, date("2026-03-02"), time("09:45"), time("10:15"))
                .is_some()
        );
    }

    #[test]
    fn appointment_transition_errors_name_both_states() {
        let err = check_appointment_transition(
            AppointmentStatus::Canceled,
            AppointmentStatus::Confirmed,
        )
        .unwrap_err();
        assert_eq!(err.from, "canceled");
        assert_eq!(err.to, "confirmed");
        assert!(check_chat_transition(ChatStatus::Pending, ChatStatus::Accepted).is_ok());
        assert!(check_chat_transition(ChatStatus::Closed, ChatStatus::Accepted).is_err());
    }

    #[test]
    fn rating_summary_rounds_to_one_decimal() {
        let summary = RatingSummary::from_totals(14, 3);
        assert_eq!(summary.average, Some(4.7));
        assert_eq!(summary.label(), "4.7 / 5 (3 ratings)");

        assert_eq!(RatingSummary::from_totals(5, 1).label(), "5.0 / 5 (1 rating)");
        assert_eq!(RatingSummary::from_totals(0, 0).label(), "No ratings yet");
    }

    #[test]
    fn age_counts_completed_years() {
        assert_eq!(age_on(date("1990-06-15"), date("2026-06-14")), 35);
        assert_eq!(age_on(date("1990-06-15"), date("2026-06-15")), 36);
        assert_eq!(age_on(date("2030-01-01"), date("2026-01-01")), 0);
    }
}
