use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_patients_table(conn)?;
    create_appointments_table(conn)?;
    create_appointment_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the patients table
fn create_patients_table(conn: &Connection) -> Result<(), String> {
    info!("Creating patients table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS patients (
            id TEXT PRIMARY KEY,
            mr_number TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            email TEXT,
            phone TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            address TEXT,
            emergency_contact TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the appointments table. Vitals are stored as a JSON blob.
fn create_appointments_table(conn: &Connection) -> Result<(), String> {
    info!("Creating appointments table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS appointments (
            id TEXT PRIMARY KEY,
            token_number INTEGER,
            patient_id TEXT NOT NULL,
            patient_name TEXT NOT NULL,
            mr_number TEXT NOT NULL,
            doctor_id TEXT NOT NULL,
            doctor_name TEXT NOT NULL,
            appointment_slot TEXT NOT NULL,
            appointment_date TEXT NOT NULL,
            status TEXT NOT NULL,
            vitals TEXT,
            diagnosis TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Tokens are unique per day; the date index backs the daily list and queue
fn create_appointment_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating appointment indexes");

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_date_token
        ON appointments (appointment_date, token_number)",
        [],
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_appointments_patient
        ON appointments (patient_id)",
        [],
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
