use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, FieldError};
use crate::relay::Event;
use crate::state::ApiState;
use pitstop_core::CarStatus;
use pitstop_db::{Car, CarChanges, NewCar};

#[derive(Debug, Deserialize)]
pub struct ListCarsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCarRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub repair_time: Option<String>,
    pub start_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCarRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub repair_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub start_date: Option<Option<String>>,
    pub status: Option<String>,
}

pub async fn list_cars(
    State(state): State<ApiState>,
    Query(query): Query<ListCarsQuery>,
) -> Result<Json<Vec<Car>>, ApiError> {
    let cars = state.db.list_cars(query.status.as_deref()).await?;
    Ok(Json(cars))
}

pub async fn get_car(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Car>, ApiError> {
    match state.db.get_car(id).await? {
        Some(car) => Ok(Json(car)),
        None => Err(ApiError::NotFound("Car")),
    }
}

pub async fn create_car(
    State(state): State<ApiState>,
    Json(payload): Json<CreateCarRequest>,
) -> Result<(StatusCode, Json<Car>), ApiError> {
    let mut errors = Vec::new();

    let brand = payload.brand.unwrap_or_default();
    if brand.trim().is_empty() {
        errors.push(FieldError::new("brand", "Brand is required"));
    }
    let model = payload.model.unwrap_or_default();
    if model.trim().is_empty() {
        errors.push(FieldError::new("model", "Model is required"));
    }
    let year = payload.year.unwrap_or_default();
    if !valid_year(year) {
        errors.push(FieldError::new("year", "Valid year is required"));
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let car = state
        .db
        .create_car(&NewCar {
            brand,
            model,
            year,
            repair_time: payload.repair_time,
            start_date: payload.start_date,
        })
        .await?;

    state.broadcaster.publish(Event::car_added(&car));

    Ok((StatusCode::CREATED, Json(car)))
}

pub async fn update_car(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCarRequest>,
) -> Result<Json<Car>, ApiError> {
    let mut errors = Vec::new();

    if let Some(brand) = &payload.brand {
        if brand.trim().is_empty() {
            errors.push(FieldError::new("brand", "Brand cannot be empty"));
        }
    }
    if let Some(model) = &payload.model {
        if model.trim().is_empty() {
            errors.push(FieldError::new("model", "Model cannot be empty"));
        }
    }
    if let Some(year) = payload.year {
        if !valid_year(year) {
            errors.push(FieldError::new("year", "Valid year is required"));
        }
    }
    if let Some(status) = &payload.status {
        if CarStatus::parse(status).is_none() {
            errors.push(FieldError::new("status", "Invalid status"));
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let changes = CarChanges {
        brand: payload.brand,
        model: payload.model,
        year: payload.year,
        repair_time: payload.repair_time,
        start_date: payload.start_date,
        status: payload.status,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    match state.db.update_car(id, &changes).await? {
        Some(car) => {
            state.broadcaster.publish(Event::car_updated(&car));
            Ok(Json(car))
        }
        None => Err(ApiError::NotFound("Car")),
    }
}

pub async fn delete_car(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if state.db.delete_car(id).await? {
        state.broadcaster.publish(Event::car_deleted(id));
        Ok(Json(json!({ "message": "Car deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Car"))
    }
}

fn valid_year(year: i64) -> bool {
    let max = i64::from(Utc::now().year()) + 1;
    (1900..=max).contains(&year)
}
