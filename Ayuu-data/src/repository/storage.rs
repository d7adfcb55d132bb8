use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use rusqlite::types::Type;
use tracing::debug;
use uuid::Uuid;

use crate::database::DatabasePool;
use crate::models::appointment::{Appointment, CreateAppointmentRequest, VitalsRecord};
use crate::models::patient::{CreatePatientRequest, Patient};
use super::errors::RepositoryError;

const PATIENT_COLUMNS: &str =
    "id, mr_number, full_name, email, phone, date_of_birth, address, emergency_contact, created_at";

const APPOINTMENT_COLUMNS: &str =
    "id, token_number, patient_id, patient_name, mr_number, doctor_id, doctor_name, \
     appointment_slot, appointment_date, status, vitals, diagnosis, created_at, updated_at";

/// Database storage operations for patients and appointments
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Insert a patient; a duplicate MR number is reported as a conflict
    pub async fn insert_patient(pool: &DatabasePool, request: CreatePatientRequest) -> Result<Patient, RepositoryError> {
        let patient = Patient {
            id: Uuid::new_v4().to_string(),
            mr_number: request.mr_number,
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            date_of_birth: request.date_of_birth,
            address: request.address,
            emergency_contact: request.emergency_contact,
            created_at: Utc::now(),
        };
        debug!("Storing patient in database: id={}", patient.id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let existing: Option<String> = conn
                    .query_row(
                        "SELECT id FROM patients WHERE mr_number = ?1",
                        params![patient.mr_number],
                        |row| row.get(0),
                    )
                    .optional()?;
                if existing.is_some() {
                    return Err(RepositoryError::Conflict(format!("MR number {} already exists", patient.mr_number)));
                }

                conn.execute(
                    "INSERT INTO patients
                     (id, mr_number, full_name, email, phone, date_of_birth, address, emergency_contact, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        patient.id,
                        patient.mr_number,
                        patient.full_name,
                        patient.email,
                        patient.phone,
                        patient.date_of_birth,
                        patient.address,
                        patient.emergency_contact,
                        patient.created_at.to_rfc3339(),
                    ],
                )?;

                Ok(patient)
            }
        }
    }

    /// Get a patient by one of its unique columns
    async fn get_patient_where(pool: &DatabasePool, column: &str, value: &str) -> Result<Option<Patient>, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let sql = format!("SELECT {} FROM patients WHERE {} = ?1", PATIENT_COLUMNS, column);
                let patient = conn.query_row(&sql, params![value], patient_from_row).optional()?;
                Ok(patient)
            }
        }
    }

    /// Get a patient by ID
    pub async fn get_patient(pool: &DatabasePool, id: &str) -> Result<Option<Patient>, RepositoryError> {
        Self::get_patient_where(pool, "id", id).await
    }

    /// Get a patient by MR number
    pub async fn get_patient_by_mr_number(pool: &DatabasePool, mr_number: &str) -> Result<Option<Patient>, RepositoryError> {
        Self::get_patient_where(pool, "mr_number", mr_number).await
    }

    /// Case-insensitive search over name, phone and MR number
    pub async fn search_patients(pool: &DatabasePool, query: &str, limit: Option<usize>) -> Result<Vec<Patient>, RepositoryError> {
        debug!("Searching patients in database: query={:?}", query);
        let pattern = format!("%{}%", query.trim().to_lowercase());
        // SQLite treats a negative LIMIT as no limit
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let sql = format!(
                    "SELECT {} FROM patients
                     WHERE lower(full_name) LIKE ?1 OR phone LIKE ?1 OR lower(mr_number) LIKE ?1
                     ORDER BY full_name LIMIT ?2",
                    PATIENT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let patients = stmt
                    .query_map(params![pattern, limit], patient_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(patients)
            }
        }
    }

    /// Insert an appointment, assigning the next token for its day in the same transaction
    pub async fn insert_appointment(pool: &DatabasePool, request: CreateAppointmentRequest) -> Result<Appointment, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let mut conn = pool.get()?;
                let tx = conn.transaction()?;

                let token: u32 = tx.query_row(
                    "SELECT COALESCE(MAX(token_number), 0) + 1 FROM appointments WHERE appointment_date = ?1",
                    params![request.appointment_date],
                    |row| row.get(0),
                )?;

                let now = Utc::now();
                let appointment = Appointment {
                    id: Uuid::new_v4().to_string(),
                    token_number: Some(token),
                    patient_id: request.patient_id,
                    patient_name: request.patient_name,
                    mr_number: request.mr_number,
                    doctor_id: request.doctor_id,
                    doctor_name: request.doctor_name,
                    appointment_slot: request.appointment_slot,
                    appointment_date: request.appointment_date,
                    status: "scheduled".to_string(),
                    vitals: None,
                    diagnosis: None,
                    created_at: now,
                    updated_at: now,
                };
                debug!("Storing appointment in database: id={}, token={}", appointment.id, token);

                tx.execute(
                    &format!(
                        "INSERT INTO appointments ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                        APPOINTMENT_COLUMNS
                    ),
                    params![
                        appointment.id,
                        appointment.token_number,
                        appointment.patient_id,
                        appointment.patient_name,
                        appointment.mr_number,
                        appointment.doctor_id,
                        appointment.doctor_name,
                        appointment.appointment_slot,
                        appointment.appointment_date,
                        appointment.status,
                        Option::<String>::None,
                        appointment.diagnosis,
                        appointment.created_at.to_rfc3339(),
                        appointment.updated_at.to_rfc3339(),
                    ],
                )?;
                tx.commit()?;

                Ok(appointment)
            }
        }
    }

    /// Get an appointment by ID
    pub async fn get_appointment(pool: &DatabasePool, id: &str) -> Result<Option<Appointment>, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let sql = format!("SELECT {} FROM appointments WHERE id = ?1", APPOINTMENT_COLUMNS);
                let appointment = conn.query_row(&sql, params![id], appointment_from_row).optional()?;
                Ok(appointment)
            }
        }
    }

    /// Appointments for one day, ordered by token
    pub async fn list_appointments_by_date(pool: &DatabasePool, date: &str) -> Result<Vec<Appointment>, RepositoryError> {
        debug!("Listing appointments from database for {}", date);
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let sql = format!(
                    "SELECT {} FROM appointments WHERE appointment_date = ?1 ORDER BY token_number ASC",
                    APPOINTMENT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let appointments = stmt
                    .query_map(params![date], appointment_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(appointments)
            }
        }
    }

    /// Appointments for one patient, newest day first
    pub async fn list_appointments_by_patient(pool: &DatabasePool, patient_id: &str) -> Result<Vec<Appointment>, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let sql = format!(
                    "SELECT {} FROM appointments WHERE patient_id = ?1
                     ORDER BY appointment_date DESC, token_number ASC",
                    APPOINTMENT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let appointments = stmt
                    .query_map(params![patient_id], appointment_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(appointments)
            }
        }
    }

    /// Write back the mutable fields of an appointment
    pub async fn update_appointment(pool: &DatabasePool, appointment: Appointment) -> Result<Appointment, RepositoryError> {
        debug!("Updating appointment in database: id={}", appointment.id);
        let vitals = appointment
            .vitals
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let changed = conn.execute(
                    "UPDATE appointments
                     SET doctor_id = ?2, doctor_name = ?3, appointment_slot = ?4, status = ?5,
                         vitals = ?6, diagnosis = ?7, updated_at = ?8
                     WHERE id = ?1",
                    params![
                        appointment.id,
                        appointment.doctor_id,
                        appointment.doctor_name,
                        appointment.appointment_slot,
                        appointment.status,
                        vitals,
                        appointment.diagnosis,
                        appointment.updated_at.to_rfc3339(),
                    ],
                )?;

                if changed == 0 {
                    return Err(RepositoryError::NotFound(format!("Appointment {} not found", appointment.id)));
                }
                Ok(appointment)
            }
        }
    }
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        mr_number: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        date_of_birth: row.get(5)?,
        address: row.get(6)?,
        emergency_contact: row.get(7)?,
        created_at: parse_timestamp(8, row.get(8)?)?,
    })
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let vitals = row
        .get::<_, Option<String>>(10)?
        .map(|json| serde_json::from_str::<VitalsRecord>(&json))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(Appointment {
        id: row.get(0)?,
        token_number: row.get(1)?,
        patient_id: row.get(2)?,
        patient_name: row.get(3)?,
        mr_number: row.get(4)?,
        doctor_id: row.get(5)?,
        doctor_name: row.get(6)?,
        appointment_slot: row.get(7)?,
        appointment_date: row.get(8)?,
        status: row.get(9)?,
        vitals,
        diagnosis: row.get(11)?,
        created_at: parse_timestamp(12, row.get(12)?)?,
        updated_at: parse_timestamp(13, row.get(13)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database_pool, DatabaseConfig};

    fn pool() -> DatabasePool {
        initialize_database_pool(&DatabaseConfig::sqlite_in_memory())
            .unwrap()
            .unwrap()
    }

    fn booking(date: &str) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_id: "p-1".to_string(),
            patient_name: "Asha Menon".to_string(),
            mr_number: "MR24010001".to_string(),
            doctor_id: "doc-1".to_string(),
            doctor_name: "Dr. Rao".to_string(),
            appointment_slot: "09:30 AM".to_string(),
            appointment_date: date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_tokens_restart_each_day() {
        let pool = pool();

        let a = DatabaseStorage::insert_appointment(&pool, booking("2024-03-01")).await.unwrap();
        let b = DatabaseStorage::insert_appointment(&pool, booking("2024-03-01")).await.unwrap();
        let c = DatabaseStorage::insert_appointment(&pool, booking("2024-03-02")).await.unwrap();

        assert_eq!(a.token_number, Some(1));
        assert_eq!(b.token_number, Some(2));
        assert_eq!(c.token_number, Some(1));

        let day = DatabaseStorage::list_appointments_by_date(&pool, "2024-03-01").await.unwrap();
        assert_eq!(day.iter().map(|a| a.token_number).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_vitals_survive_update() {
        let pool = pool();
        let mut appointment = DatabaseStorage::insert_appointment(&pool, booking("2024-03-01")).await.unwrap();

        appointment.status = "vitals_done".to_string();
        appointment.vitals = Some(VitalsRecord {
            systolic: 150.0,
            diastolic: 95.0,
            pulse: 88.0,
            temperature_c: 37.0,
            spo2: Some(97.0),
            height_cm: Some(170.0),
            weight_kg: Some(80.0),
            bmi: Some(27.7),
            notes: None,
            risk_score: 40,
            risk_level: "moderate".to_string(),
            taken_by: "nurse-1".to_string(),
            taken_at: Utc::now(),
        });
        DatabaseStorage::update_appointment(&pool, appointment.clone()).await.unwrap();

        let stored = DatabaseStorage::get_appointment(&pool, &appointment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "vitals_done");
        assert_eq!(stored.vitals.as_ref().map(|v| v.risk_score), Some(40));
    }

    #[tokio::test]
    async fn test_patient_search_is_case_insensitive() {
        let pool = pool();
        let request = CreatePatientRequest {
            mr_number: "MR24010001".to_string(),
            full_name: "Asha Menon".to_string(),
            email: None,
            phone: "9876543210".to_string(),
            date_of_birth: "1980-05-12".to_string(),
            address: None,
            emergency_contact: None,
        };
        DatabaseStorage::insert_patient(&pool, request.clone()).await.unwrap();

        let found = DatabaseStorage::search_patients(&pool, "asha", None).await.unwrap();
        assert_eq!(found.len(), 1);
        let by_mr = DatabaseStorage::get_patient_by_mr_number(&pool, "MR24010001").await.unwrap();
        assert!(by_mr.is_some());

        let duplicate = DatabaseStorage::insert_patient(&pool, request).await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
    }
}
