use actix_web::{web, HttpResponse, Responder};
use crate::models::{
    AppointmentFilter, AppointmentIdQuery, AppointmentResponse, AppointmentsResponse, CreateAppointmentRequest,
    ErrorResponse, RequestError, UpdateAppointmentRequest,
};
use crate::models::requests::parse_appointment_id;
use crate::routes::{bad_request, AppState};
use crate::services::PostgresClient;
use std::sync::Arc;

/// Configure appointment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/appointments")
            .route(web::get().to(list_appointments))
            .route(web::post().to(create_appointment))
            .route(web::put().to(update_appointment))
            .route(web::delete().to(cancel_appointment)),
    );
}

/// Appointment store, or the 503 returned when none is configured
fn store(state: &AppState) -> Result<&Arc<PostgresClient>, HttpResponse> {
    state.postgres.as_ref().ok_or_else(|| {
        HttpResponse::ServiceUnavailable().json(ErrorResponse::new("Appointment storage is not configured"))
    })
}

/// GET /api/appointments?patientId=&providerId=
async fn list_appointments(
    state: web::Data<AppState>,
    query: web::Query<AppointmentFilter>,
) -> impl Responder {
    let postgres = match store(&state) {
        Ok(postgres) => postgres,
        Err(response) => return response,
    };

    match postgres.list_appointments(&query).await {
        Ok(appointments) => HttpResponse::Ok().json(AppointmentsResponse { appointments }),
        Err(e) => {
            tracing::error!("Failed to list appointments: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to fetch appointments"))
        }
    }
}

/// POST /api/appointments
async fn create_appointment(
    state: web::Data<AppState>,
    req: web::Json<CreateAppointmentRequest>,
) -> impl Responder {
    let postgres = match store(&state) {
        Ok(postgres) => postgres,
        Err(response) => return response,
    };

    let new = match req.into_inner().into_new_appointment() {
        Ok(new) => new,
        Err(e) => return bad_request(&e),
    };

    match postgres.create_appointment(new).await {
        Ok(appointment) => {
            tracing::info!("Created appointment {}", appointment.id);
            HttpResponse::Created().json(AppointmentResponse {
                message: "Appointment created successfully".to_string(),
                appointment: Some(appointment),
            })
        }
        Err(e) => {
            tracing::error!("Failed to create appointment: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to create appointment"))
        }
    }
}

/// PUT /api/appointments
async fn update_appointment(
    state: web::Data<AppState>,
    req: web::Json<UpdateAppointmentRequest>,
) -> impl Responder {
    let (id, changes) = match req.into_inner().into_changes() {
        Ok(parsed) => parsed,
        Err(e) => return bad_request(&e),
    };

    let postgres = match store(&state) {
        Ok(postgres) => postgres,
        Err(response) => return response,
    };

    match postgres.update_appointment(id, changes).await {
        Ok(Some(appointment)) => HttpResponse::Ok().json(AppointmentResponse {
            message: "Appointment updated successfully".to_string(),
            appointment: Some(appointment),
        }),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::new("Appointment not found")),
        Err(e) => {
            tracing::error!("Failed to update appointment {}: {}", id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to update appointment"))
        }
    }
}

/// DELETE /api/appointments?id=
async fn cancel_appointment(
    state: web::Data<AppState>,
    query: web::Query<AppointmentIdQuery>,
) -> impl Responder {
    let id = match query.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return bad_request(&RequestError::MissingAppointmentId),
    };

    let id = match parse_appointment_id(id) {
        Ok(id) => id,
        Err(e) => return bad_request(&e),
    };

    let postgres = match store(&state) {
        Ok(postgres) => postgres,
        Err(response) => return response,
    };

    match postgres.cancel_appointment(id).await {
        Ok(true) => HttpResponse::Ok().json(AppointmentResponse {
            message: "Appointment cancelled successfully".to_string(),
            appointment: None,
        }),
        Ok(false) => HttpResponse::NotFound().json(ErrorResponse::new("Appointment not found")),
        Err(e) => {
            tracing::error!("Failed to cancel appointment {}: {}", id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to cancel appointment"))
        }
    }
}
