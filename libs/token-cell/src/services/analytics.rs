use std::collections::HashMap;

use chrono::NaiveDate;

use clinic_cell::{average_wait_minutes, Doctor, TokenStat};

use crate::models::{ClinicAnalytics, DoctorWorkload, StatusBreakdown};

/// Day summary for a clinic dashboard.
pub fn build_analytics(
    clinic_name: &str,
    date: NaiveDate,
    stats: &[TokenStat],
    doctors: &[Doctor],
) -> ClinicAnalytics {
    let names: HashMap<i64, &str> = doctors.iter().map(|d| (d.id, d.name.as_str())).collect();

    let mut per_doctor: HashMap<i64, usize> = HashMap::new();
    for stat in stats {
        *per_doctor.entry(stat.doctor_id).or_insert(0) += 1;
    }

    let mut doctor_workload: Vec<DoctorWorkload> = per_doctor
        .into_iter()
        .map(|(doctor_id, count)| DoctorWorkload {
            doctor_name: names.get(&doctor_id).map(|n| n.to_string()).unwrap_or_else(|| format!("Doctor {}", doctor_id)),
            count,
        })
        .collect();
    doctor_workload.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.doctor_name.cmp(&b.doctor_name)));

    let count_status = |status: &str| stats.iter().filter(|s| s.status == status).count();
    let average = average_wait_minutes(stats).unwrap_or(0.0);

    ClinicAnalytics {
        clinic_name: clinic_name.to_string(),
        date: date.format("%B %d, %Y").to_string(),
        total_patients: stats.len(),
        average_wait_time_minutes: (average * 10.0).round() / 10.0,
        doctor_workload,
        patient_status_breakdown: StatusBreakdown {
            waiting: count_status("waiting"),
            confirmed: count_status("confirmed"),
            completed: stats
                .iter()
                .filter(|s| s.status == "completed" && s.completed_at.is_some())
                .count(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn doctor(id: i64, name: &str) -> Doctor {
        Doctor {
            id,
            user_id: None,
            name: name.to_string(),
            specialization: "General Medicine".to_string(),
            clinic_id: Some(1),
            role: "doctor".to_string(),
            user: None,
        }
    }

    fn stat(doctor_id: i64, status: &str, wait: Option<i64>) -> TokenStat {
        let created_at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        TokenStat {
            clinic_id: Some(1),
            doctor_id,
            status: status.to_string(),
            created_at,
            completed_at: wait.map(|m| created_at + Duration::seconds(m)),
        }
    }

    #[test]
    fn summarises_the_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 9).unwrap();
        let doctors = vec![doctor(3, "Mehta"), doctor(4, "Rao")];
        let stats = vec![
            stat(3, "completed", Some(600)),
            stat(3, "completed", Some(700)),
            stat(3, "waiting", None),
            stat(4, "confirmed", None),
        ];

        let analytics = build_analytics("City Clinic", date, &stats, &doctors);

        assert_eq!(analytics.date, "October 09, 2026");
        assert_eq!(analytics.total_patients, 4);
        assert_eq!(analytics.average_wait_time_minutes, 10.8);
        assert_eq!(analytics.doctor_workload[0], DoctorWorkload { doctor_name: "Mehta".into(), count: 3 });
        assert_eq!(analytics.doctor_workload[1].count, 1);
        assert_eq!(analytics.patient_status_breakdown, StatusBreakdown { waiting: 1, confirmed: 1, completed: 2 });
    }

    #[test]
    fn empty_day_has_zero_wait() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let analytics = build_analytics("City Clinic", date, &[], &[]);
        assert_eq!(analytics.average_wait_time_minutes, 0.0);
        assert!(analytics.doctor_workload.is_empty());
    }
}
