//! Scheduled weather sweep

use std::collections::HashMap;
use std::slice;
use std::time::Duration;

use axum::{extract::State, Json};

use crate::error::{AppError, ConfigurationError, Result};
use crate::notification::{compose, is_eligible, AlertContext, NotificationCategory, Recipient};
use crate::server::AppState;
use crate::store::load_recipients;

use super::models::WeatherCheckResponse;

/// Check weather for every upcoming trip and alert eligible owners.
///
/// Owners who could not receive a weather warning are skipped before any
/// weather call is made. Weather lookups are spaced by
/// `weather.request_spacing_ms`.
#[tracing::instrument(name = "http.check_weather", skip(state))]
pub async fn check_weather(State(state): State<AppState>) -> Result<Json<WeatherCheckResponse>> {
    let dispatcher = state.push_dispatcher()?;
    let weather = state
        .weather
        .clone()
        .ok_or(ConfigurationError::MissingSetting("weather.api_key"))?;

    let config = &state.settings.weather;
    let trips = state.store.upcoming_trips(config.lookahead_days).await?;

    if trips.is_empty() {
        tracing::info!("No trips to check");
        return Ok(Json(WeatherCheckResponse {
            success: true,
            checked: 0,
            alerts_sent: 0,
            total_trips: 0,
        }));
    }

    let mut owner_ids: Vec<String> = Vec::new();
    for trip in &trips {
        if !owner_ids.contains(&trip.owner_id) {
            owner_ids.push(trip.owner_id.clone());
        }
    }
    let owners: HashMap<String, Recipient> = load_recipients(state.store.as_ref(), &owner_ids)
        .await
        .into_iter()
        .map(|r| (r.user_id.clone(), r))
        .collect();

    let category = NotificationCategory::WeatherWarnings.as_str();
    let spacing = Duration::from_millis(config.request_spacing_ms);
    let mut checked = 0;
    let mut alerts_sent = 0;

    for trip in &trips {
        let Some(owner) = owners.get(&trip.owner_id).filter(|o| is_eligible(o, category)) else {
            continue;
        };

        checked += 1;
        let alerts = weather.alerts(trip.destination_lat, trip.destination_lng).await;

        if !alerts.is_empty() {
            let context = AlertContext {
                trip_title: trip.title.clone(),
                destination: trip.destination.clone(),
                entity_id: Some(trip.id.clone()),
            };
            match compose(&alerts, &context) {
                Ok(message) => {
                    let result = dispatcher.dispatch(&message, slice::from_ref(owner)).await;
                    if let Some(e) = result.credential_error {
                        tracing::error!(
                            trip_id = %trip.id,
                            checked = checked,
                            alerts_sent = alerts_sent,
                            "Weather sweep aborted, no push credentials"
                        );
                        return Err(AppError::Credential(e));
                    }
                    if result.summary().sent > 0 {
                        alerts_sent += 1;
                        tracing::info!(
                            trip_id = %trip.id,
                            alert_count = alerts.len(),
                            "Weather alert sent"
                        );
                    }
                }
                Err(e) => tracing::warn!(trip_id = %trip.id, error = %e, "Could not compose weather alert"),
            }
        }

        if !spacing.is_zero() {
            tokio::time::sleep(spacing).await;
        }
    }

    tracing::info!(
        checked = checked,
        alerts_sent = alerts_sent,
        total_trips = trips.len(),
        "Weather sweep complete"
    );
    Ok(Json(WeatherCheckResponse {
        success: true,
        checked,
        alerts_sent,
        total_trips: trips.len(),
    }))
}
