use crate::models::{Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, NewAppointment};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

const APPOINTMENT_COLUMNS: &str = "id, patient_id, provider_id, provider_name, provider_address, \
     date, time, duration, service, status, created_at";

/// PostgreSQL store for booked appointments
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Insert a new confirmed appointment
    pub async fn create_appointment(&self, new: NewAppointment) -> Result<Appointment, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO appointments
                (id, patient_id, provider_id, provider_name, provider_address,
                 date, time, duration, service, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(&new.patient_id)
            .bind(&new.provider_id)
            .bind(&new.provider_name)
            .bind(&new.provider_address)
            .bind(new.date)
            .bind(new.time)
            .bind(new.duration)
            .bind(&new.service)
            .bind(AppointmentStatus::Confirmed)
            .fetch_one(&self.pool)
            .await?;

        let appointment = appointment_from_row(&row)?;
        tracing::debug!(
            "Created appointment {} for patient {} with provider {}",
            appointment.id,
            appointment.patient_id,
            appointment.provider_id
        );

        Ok(appointment)
    }

    /// List appointments, optionally filtered by patient and/or provider
    pub async fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, PostgresError> {
        let query = format!(
            r#"
            SELECT {}
            FROM appointments
            WHERE ($1::TEXT IS NULL OR patient_id = $1)
              AND ($2::TEXT IS NULL OR provider_id = $2)
            ORDER BY date ASC, time ASC
            "#,
            APPOINTMENT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(filter.patient_id.as_deref())
            .bind(filter.provider_id.as_deref())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| appointment_from_row(row).map_err(Into::into))
            .collect()
    }

    /// Apply a partial update; `None` when the id is unknown
    pub async fn update_appointment(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> Result<Option<Appointment>, PostgresError> {
        let query = format!(
            r#"
            UPDATE appointments SET
                date = COALESCE($2, date),
                time = COALESCE($3, time),
                duration = COALESCE($4, duration),
                service = COALESCE($5, service),
                status = COALESCE($6, status)
            WHERE id = $1
            RETURNING {}
            "#,
            APPOINTMENT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(changes.date)
            .bind(changes.time)
            .bind(changes.duration)
            .bind(changes.service)
            .bind(changes.status)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(appointment_from_row)
            .transpose()
            .map_err(Into::into)
    }

    /// Mark an appointment cancelled; `false` when the id is unknown
    pub async fn cancel_appointment(&self, id: Uuid) -> Result<bool, PostgresError> {
        let result = sqlx::query("UPDATE appointments SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(AppointmentStatus::Cancelled)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!("Cancelled appointment {}", id);
        }

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn appointment_from_row(row: &PgRow) -> Result<Appointment, sqlx::Error> {
    Ok(Appointment {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        provider_id: row.try_get("provider_id")?,
        provider_name: row.try_get("provider_name")?,
        provider_address: row.try_get("provider_address")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        duration: row.try_get("duration")?,
        service: row.try_get("service")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}
