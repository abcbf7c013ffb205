use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::Deserialize;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Doctor, TokenStat};
use crate::services::directory::ClinicService;
use crate::ClinicError;

pub const SLOT_MINUTES: i64 = 15;
const DAY_START_HOUR: u32 = 9;
const DAY_END_HOUR: u32 = 17;

#[derive(Debug, Deserialize)]
struct BookedSlot {
    appointment_time: Option<NaiveTime>,
}

/// Every slot start of a doctor's day: 09:00, 09:15, ..., 16:45.
pub fn slot_starts() -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    let (Some(mut current), Some(end)) = (
        NaiveTime::from_hms_opt(DAY_START_HOUR, 0, 0),
        NaiveTime::from_hms_opt(DAY_END_HOUR, 0, 0),
    ) else {
        return slots;
    };

    while current < end {
        slots.push(current);
        current += Duration::minutes(SLOT_MINUTES);
    }
    slots
}

pub fn is_slot_start(time: NaiveTime) -> bool {
    time.second() == 0 && time.nanosecond() == 0 && slot_starts().contains(&time)
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_slot_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn format_slot(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Free slots of `date` given the starts already held. Past days have none; today drops
/// slots that have already begun.
pub fn compute_available_slots(
    date: NaiveDate,
    today: NaiveDate,
    now: NaiveTime,
    taken: &[NaiveTime],
) -> Vec<NaiveTime> {
    if date < today {
        return Vec::new();
    }

    slot_starts()
        .into_iter()
        .filter(|slot| !taken.contains(slot))
        .filter(|slot| date > today || *slot > now)
        .collect()
}

/// Fewest tokens on the day wins; ties go to the lowest id.
pub fn pick_least_loaded<'a>(doctors: &'a [Doctor], stats: &[TokenStat]) -> Option<&'a Doctor> {
    let mut load: HashMap<i64, usize> = HashMap::new();
    for stat in stats {
        *load.entry(stat.doctor_id).or_insert(0) += 1;
    }

    doctors
        .iter()
        .min_by_key(|doctor| (load.get(&doctor.id).copied().unwrap_or(0), doctor.id))
}

pub struct AvailabilityService {
    supabase: SupabaseClient,
    clinics: ClinicService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            clinics: ClinicService::new(config),
        }
    }

    /// Slot starts held by any non-cancelled token of the doctor on that day.
    pub async fn booked_slots(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<NaiveTime>, ClinicError> {
        let path = format!(
            "/rest/v1/tokens?select=appointment_time&doctor_id=eq.{}&date=eq.{}&status=neq.cancelled&appointment_time=not.is.null",
            doctor_id, date
        );
        let rows: Vec<BookedSlot> = self.supabase.select(&path).await?;
        Ok(rows.into_iter().filter_map(|row| row.appointment_time).collect())
    }

    pub async fn available_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        today: NaiveDate,
        now: NaiveTime,
    ) -> Result<Vec<NaiveTime>, ClinicError> {
        debug!("Computing available slots for doctor {} on {}", doctor_id, date);

        if self.clinics.get_doctor(doctor_id).await?.is_none() {
            return Err(ClinicError::DoctorNotFound);
        }
        if date < today {
            return Ok(Vec::new());
        }

        let taken = self.booked_slots(doctor_id, date).await?;
        Ok(compute_available_slots(date, today, now, &taken))
    }

    pub async fn least_loaded_doctor(&self, clinic_id: i64, date: NaiveDate) -> Result<Option<Doctor>, ClinicError> {
        let doctors = self.clinics.doctors_for_clinic(clinic_id).await?;
        if doctors.is_empty() {
            return Ok(None);
        }

        let stats = self.clinics.token_stats(Some(clinic_id), date).await?;
        Ok(pick_least_loaded(&doctors, &stats).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn doctor(id: i64) -> Doctor {
        Doctor {
            id,
            user_id: None,
            name: format!("Doctor {}", id),
            specialization: "General Medicine".to_string(),
            clinic_id: Some(1),
            role: "doctor".to_string(),
            user: None,
        }
    }

    fn stat(doctor_id: i64) -> TokenStat {
        TokenStat {
            clinic_id: Some(1),
            doctor_id,
            status: "waiting".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn day_has_thirty_two_slots() {
        let slots = slot_starts();
        assert_eq!(slots.len(), 32);
        assert_eq!(slots.first(), Some(&t(9, 0)));
        assert_eq!(slots.last(), Some(&t(16, 45)));
    }

    #[test]
    fn taken_slots_are_removed() {
        let slots = compute_available_slots(d(21), d(19), t(12, 0), &[t(9, 0), t(9, 30)]);
        assert_eq!(slots.len(), 30);
        assert_eq!(slots[0], t(9, 15));
        assert!(!slots.contains(&t(9, 30)));
    }

    #[test]
    fn today_drops_started_slots() {
        let slots = compute_available_slots(d(19), d(19), t(16, 15), &[]);
        assert_eq!(slots, vec![t(16, 30), t(16, 45)]);
    }

    #[test]
    fn past_days_have_no_slots() {
        assert!(compute_available_slots(d(18), d(19), t(8, 0), &[]).is_empty());
    }

    #[test]
    fn slot_parsing_accepts_both_formats() {
        assert_eq!(parse_slot_time("09:15"), Some(t(9, 15)));
        assert_eq!(parse_slot_time("09:15:00"), Some(t(9, 15)));
        assert_eq!(parse_slot_time("9am"), None);
        assert!(is_slot_start(t(16, 45)));
        assert!(!is_slot_start(t(17, 0)));
        assert!(!is_slot_start(t(9, 10)));
        assert_eq!(format_slot(t(9, 5)), "09:05");
    }

    #[test]
    fn least_loaded_prefers_lowest_id_on_ties() {
        let doctors = vec![doctor(4), doctor(2), doctor(3)];
        let stats = vec![stat(2), stat(2), stat(4)];
        assert_eq!(pick_least_loaded(&doctors, &stats).map(|d| d.id), Some(3));

        let even = vec![stat(2), stat(3), stat(4)];
        assert_eq!(pick_least_loaded(&doctors, &even).map(|d| d.id), Some(2));
        assert!(pick_least_loaded(&[], &even).is_none());
    }
}
