//! Appointment lifecycle rules: status transitions, list ordering, search and
//! the live-queue wait estimate.

use thiserror::Error;

use crate::entities::appointment::{Appointment, AppointmentStatus, QueueSummary};
use crate::entities::user::Role;

/// Warning shown when vitals are entered for a finished visit
pub const VITALS_LOCKED_MESSAGE: &str = "Vitals cannot be updated for completed patients";

/// Minutes of waiting counted for each active appointment ahead in the queue
pub const MINUTES_PER_PATIENT: u32 = 15;

/// Why a status change was refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The role may never request this status
    #[error("Role {role} may not set status {requested}")]
    NotPermitted { role: Role, requested: AppointmentStatus },

    /// The status graph has no edge between the two statuses
    #[error("Cannot move an appointment from {from} to {to}")]
    InvalidTransition { from: AppointmentStatus, to: AppointmentStatus },

    /// Completed and cancelled appointments are closed
    #[error("Appointment is already {0}")]
    Terminal(AppointmentStatus),
}

/// Statuses a role may request at all
pub fn allowed_targets(role: Role) -> &'static [AppointmentStatus] {
    use crate::entities::appointment::AppointmentStatus::*;
    match role {
        Role::Admin => &AppointmentStatus::ALL,
        Role::Doctor => &[VitalsDone, WithDoctor, ReturnQueue, Completed],
        Role::Staff => &[VitalsDone],
    }
}

fn edge_exists(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use crate::entities::appointment::AppointmentStatus::*;
    matches!(
        (from, to),
        (Scheduled, VitalsDone)
            | (VitalsDone, VitalsDone)
            | (VitalsDone, WithDoctor)
            | (WithDoctor, Completed)
            | (WithDoctor, ReturnQueue)
            | (ReturnQueue, VitalsDone)
            | (ReturnQueue, WithDoctor)
    )
}

/// Decide a status change requested by `role`.
///
/// Admins may set any status from any status. Everybody else is limited to
/// the statuses of their role and to the edges of the status graph.
pub fn transition(
    current: AppointmentStatus,
    requested: AppointmentStatus,
    role: Role,
) -> Result<AppointmentStatus, TransitionError> {
    if role == Role::Admin {
        return Ok(requested);
    }

    if !allowed_targets(role).contains(&requested) {
        return Err(TransitionError::NotPermitted { role, requested });
    }

    if current.is_terminal() {
        return Err(TransitionError::Terminal(current));
    }

    if !edge_exists(current, requested) {
        return Err(TransitionError::InvalidTransition { from: current, to: requested });
    }

    Ok(requested)
}

/// Vitals may be entered for any appointment that is not completed
pub fn ensure_vitals_editable(appointment: &Appointment) -> Result<(), &'static str> {
    if appointment.status == AppointmentStatus::Completed {
        return Err(VITALS_LOCKED_MESSAGE);
    }
    Ok(())
}

/// Order for list views: completed last, then ascending token. Stable.
pub fn sort_for_display(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|a| (a.status == AppointmentStatus::Completed, a.token()));
}

/// Case-insensitive substring match over the searchable fields. The term is
/// used as typed: an empty term matches everything, whitespace is matched
/// literally.
pub fn matches_search(appointment: &Appointment, term: &str) -> bool {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return true;
    }

    [
        appointment.patient_name.as_str(),
        appointment.doctor_name.as_str(),
        appointment.status.as_str(),
        appointment.patient_id.as_str(),
        appointment.mr_number.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
        || appointment.token().to_string().contains(&needle)
}

/// Wait estimate for one appointment of a day's queue
pub fn estimated_wait(queue: &[Appointment], appointment: &Appointment) -> String {
    match appointment.status {
        AppointmentStatus::Completed | AppointmentStatus::Cancelled => "N/A".to_string(),
        AppointmentStatus::WithDoctor => "In Progress".to_string(),
        _ => {
            let ahead = queue
                .iter()
                .filter(|other| other.id != appointment.id)
                .filter(|other| other.token() < appointment.token())
                .filter(|other| other.status.is_waiting())
                .count() as u32;
            format!("{} min", ahead * MINUTES_PER_PATIENT)
        }
    }
}

/// Per-status counts for a day's appointments
pub fn queue_summary(appointments: &[Appointment]) -> QueueSummary {
    let mut summary = QueueSummary {
        total: appointments.len(),
        ..QueueSummary::default()
    };

    for appointment in appointments {
        match appointment.status {
            AppointmentStatus::Scheduled => summary.scheduled += 1,
            AppointmentStatus::VitalsDone => summary.vitals_done += 1,
            AppointmentStatus::WithDoctor => summary.with_doctor += 1,
            AppointmentStatus::Completed => summary.completed += 1,
            AppointmentStatus::ReturnQueue => summary.return_queue += 1,
            AppointmentStatus::Cancelled => summary.cancelled += 1,
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use crate::entities::appointment::AppointmentStatus::*;

    fn appointment(id: &str, token: Option<u32>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: id.to_string(),
            token_number: token,
            patient_id: format!("patient-{}", id),
            patient_name: format!("Patient {}", id),
            mr_number: format!("MR2403{:0>4}", id),
            doctor_id: "doc-1".to_string(),
            doctor_name: "Dr. Rao".to_string(),
            appointment_slot: "09:00 AM".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status,
            vitals: None,
            diagnosis: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_may_set_anything() {
        for from in AppointmentStatus::ALL {
            for to in AppointmentStatus::ALL {
                assert_eq!(transition(from, to, Role::Admin), Ok(to));
            }
        }
    }

    #[test]
    fn test_staff_only_records_vitals() {
        assert_eq!(transition(Scheduled, VitalsDone, Role::Staff), Ok(VitalsDone));
        assert_eq!(
            transition(VitalsDone, WithDoctor, Role::Staff),
            Err(TransitionError::NotPermitted { role: Role::Staff, requested: WithDoctor })
        );
        assert!(matches!(
            transition(Scheduled, Cancelled, Role::Staff),
            Err(TransitionError::NotPermitted { .. })
        ));
    }

    #[test]
    fn test_doctor_follows_the_graph() {
        assert_eq!(transition(VitalsDone, WithDoctor, Role::Doctor), Ok(WithDoctor));
        assert_eq!(transition(WithDoctor, Completed, Role::Doctor), Ok(Completed));
        assert_eq!(transition(WithDoctor, ReturnQueue, Role::Doctor), Ok(ReturnQueue));
        assert_eq!(transition(ReturnQueue, WithDoctor, Role::Doctor), Ok(WithDoctor));
        assert_eq!(
            transition(Scheduled, Completed, Role::Doctor),
            Err(TransitionError::InvalidTransition { from: Scheduled, to: Completed })
        );
        assert_eq!(
            transition(Completed, WithDoctor, Role::Doctor),
            Err(TransitionError::Terminal(Completed))
        );
        assert!(matches!(
            transition(WithDoctor, Scheduled, Role::Doctor),
            Err(TransitionError::NotPermitted { .. })
        ));
    }

    #[test]
    fn test_completed_sorts_last() {
        let mut list = vec![
            appointment("a", Some(3), Scheduled),
            appointment("b", Some(1), VitalsDone),
            appointment("c", None, Completed),
            appointment("d", Some(2), WithDoctor),
        ];
        sort_for_display(&mut list);
        let order: Vec<&str> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_completed_token_zero_sorts_after_open_tokens() {
        let mut list = vec![
            appointment("t3", Some(3), Scheduled),
            appointment("t1", Some(1), Scheduled),
            appointment("t2", Some(2), Scheduled),
            appointment("done", Some(0), Completed),
        ];
        sort_for_display(&mut list);
        let tokens: Vec<(Option<u32>, AppointmentStatus)> =
            list.iter().map(|a| (a.token_number, a.status)).collect();
        assert_eq!(
            tokens,
            vec![(Some(1), Scheduled), (Some(2), Scheduled), (Some(3), Scheduled), (Some(0), Completed)]
        );
    }

    #[test]
    fn test_missing_token_sorts_first_among_open() {
        let mut list = vec![
            appointment("a", Some(1), Scheduled),
            appointment("b", None, Scheduled),
            appointment("c", Some(1), Completed),
            appointment("d", Some(0), Completed),
        ];
        sort_for_display(&mut list);
        let order: Vec<&str> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn test_search_fields() {
        let a = appointment("7", Some(12), VitalsDone);
        assert!(matches_search(&a, ""));
        assert!(matches_search(&a, "patient 7"));
        assert!(matches_search(&a, "DR. RAO"));
        assert!(matches_search(&a, "vitals_done"));
        assert!(matches_search(&a, "12"));
        assert!(matches_search(&a, "mr24030007"));
        assert!(!matches_search(&a, "cardiology"));
    }

    #[test]
    fn test_search_term_is_not_trimmed() {
        let a = appointment("7", Some(12), VitalsDone);
        assert!(matches_search(&a, " "));
        assert!(matches_search(&a, "dr. "));
        assert!(!matches_search(&a, "  "));
        assert!(!matches_search(&a, " 12"));
    }

    #[test]
    fn test_vitals_locked_once_completed() {
        let done = appointment("a", Some(1), Completed);
        assert_eq!(ensure_vitals_editable(&done), Err(VITALS_LOCKED_MESSAGE));
        let back = appointment("b", Some(2), ReturnQueue);
        assert!(ensure_vitals_editable(&back).is_ok());
    }

    #[test]
    fn test_estimated_wait() {
        let queue = vec![
            appointment("a", Some(1), Completed),
            appointment("b", Some(2), WithDoctor),
            appointment("c", Some(3), VitalsDone),
            appointment("d", Some(4), ReturnQueue),
            appointment("e", Some(5), Scheduled),
            appointment("f", Some(6), Cancelled),
        ];
        assert_eq!(estimated_wait(&queue, &queue[0]), "N/A");
        assert_eq!(estimated_wait(&queue, &queue[1]), "In Progress");
        assert_eq!(estimated_wait(&queue, &queue[2]), "15 min");
        assert_eq!(estimated_wait(&queue, &queue[4]), "30 min");
        assert_eq!(estimated_wait(&queue, &queue[5]), "N/A");

        let summary = queue_summary(&queue);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.return_queue, 1);
    }
}
