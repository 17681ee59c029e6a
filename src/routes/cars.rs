//! Car inventory CRUD endpoints
//!
//! Listing is public; create, update, and delete sit behind the auth
//! middleware (wired in `server.rs`). Handlers validate field-level input
//! and pass through to the database layer.

use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::models::AuthUser;
use crate::database::models::{Car, CarInput};
use crate::error::{ApiError, FieldError};
use crate::extract::{Json, Path};
use crate::server::AppState;

/// First production automobile; listings cannot predate it.
const MIN_YEAR: i32 = 1886;

/// Raw request body for create and update. Every field is optional at the
/// serde level so that missing fields surface as 400 field errors rather
/// than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CarPayload {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<f64>,
    pub mileage: Option<i32>,
    pub color: Option<String>,
    pub description: Option<String>,
}

fn required_string(
    value: Option<&String>,
    field: &'static str,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.clone(),
        _ => {
            errors.push(FieldError::new(field, format!("{label} is required")));
            String::new()
        }
    }
}

/// Validate an incoming car payload, collecting every field failure so the
/// client gets all of them in one 400 response.
fn validate(payload: &CarPayload) -> Result<CarInput, ApiError> {
    let mut errors = Vec::new();

    let make = required_string(payload.make.as_ref(), "make", "Make", &mut errors);
    let model = required_string(payload.model.as_ref(), "model", "Model", &mut errors);

    let max_year = Utc::now().year() + 1;
    let year = match payload.year {
        Some(year) if (MIN_YEAR..=max_year).contains(&year) => year,
        _ => {
            errors.push(FieldError::new(
                "year",
                format!("Year must be an integer between {MIN_YEAR} and {max_year}"),
            ));
            0
        }
    };

    let price = match payload.price {
        Some(price) if price.is_finite() && price >= 0.0 => price,
        _ => {
            errors.push(FieldError::new("price", "Price must be a non-negative number"));
            0.0
        }
    };

    let mileage = match payload.mileage {
        Some(mileage) if mileage >= 0 => mileage,
        _ => {
            errors.push(FieldError::new(
                "mileage",
                "Mileage must be a non-negative integer",
            ));
            0
        }
    };

    let color = required_string(payload.color.as_ref(), "color", "Color", &mut errors);

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    Ok(CarInput {
        make,
        model,
        year,
        price,
        mileage,
        color,
        description: payload.description.clone(),
    })
}

/// `GET /api/cars`: list all car listings. Public.
pub async fn list_cars(State(state): State<AppState>) -> Result<Json<Vec<Car>>, ApiError> {
    let cars = state.db.list_cars().await?;
    Ok(Json(cars))
}

/// `POST /api/cars`: add a car listing. Requires authentication; the
/// middleware guarantees the `AuthUser` extension is present.
pub async fn create_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CarPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let input = validate(&payload)?;
    let car = state.db.insert_car(&input).await?;
    tracing::info!(
        "User {} created car listing {} ({} {})",
        user.username,
        car.id,
        car.make,
        car.model
    );
    Ok((StatusCode::CREATED, Json(car)))
}

/// `PUT /api/cars/{id}`: replace a car listing. Requires authentication.
pub async fn update_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CarPayload>,
) -> Result<Json<Car>, ApiError> {
    let input = validate(&payload)?;
    let car = state
        .db
        .update_car(id, &input)
        .await?
        .ok_or(ApiError::NotFound("Car"))?;
    Ok(Json(car))
}

/// `DELETE /api/cars/{id}`: remove a car listing. Requires authentication.
pub async fn delete_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_car(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Car"))
    }
}
