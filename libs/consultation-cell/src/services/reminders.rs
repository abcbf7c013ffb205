use chrono::{Days, NaiveDate};

use notification_cell::ReminderJob;

use crate::models::{DoseTiming, PrescriptionItem};

fn timings(item: &PrescriptionItem) -> impl Iterator<Item = DoseTiming> + '_ {
    [
        (item.timing_morning, DoseTiming::Morning),
        (item.timing_afternoon, DoseTiming::Afternoon),
        (item.timing_evening, DoseTiming::Evening),
    ]
    .into_iter()
    .filter_map(|(enabled, timing)| enabled.then_some(timing))
}

/// One reminder per enabled dose for each of the `duration_days` days following `today`.
pub fn plan_prescription_reminders(
    patient_name: &str,
    phone_number: &str,
    items: &[PrescriptionItem],
    today: NaiveDate,
) -> Vec<ReminderJob> {
    let mut jobs = Vec::new();

    for item in items {
        for day in 1..=item.duration_days.max(0) as u64 {
            let Some(date) = today.checked_add_days(Days::new(day)) else {
                continue;
            };

            for timing in timings(item) {
                let Some(time) = timing.time() else {
                    continue;
                };
                let message = format!(
                    "Hi {}, it's time for your {} dose of {}.",
                    patient_name,
                    timing.label(),
                    item.medicine_name
                );
                jobs.push(ReminderJob::new(phone_number, message, date.and_time(time).and_utc()));
            }
        }
    }

    jobs
}
