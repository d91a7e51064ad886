//! Settings REST route handlers
//!
//! - `GET /settings/site` - Live broadcast state (public)
//! - `PUT /settings/site` - Update broadcast state (god-mode)
//! - `GET /settings/system` - Operational flags (public)
//! - `PUT /settings/system` - Update operational flags (god-mode)
//!
//! Site-settings changes are published on the realtime channel so
//! connected players switch to/from the live stream immediately.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::error::ApiResult;
use crate::middleware::GodUser;
use crate::models::{SiteSettingsInput, SystemSettingsInput};
use crate::realtime::{SettingsEvent, SettingsPubSub};
use crate::repositories::SettingsRepository;

/// Shared application state for settings handlers
#[derive(Clone)]
pub struct SettingsRoutesState {
    /// Settings repository
    pub settings: SettingsRepository,
    /// Realtime fan-out for site-settings changes
    pub pubsub: SettingsPubSub,
}

/// Create the settings router
pub fn settings_router(state: SettingsRoutesState) -> Router {
    Router::new()
        .route("/site", get(get_site).put(update_site))
        .route("/system", get(get_system).put(update_system))
        .with_state(state)
}

/// Live broadcast state
///
/// # Response
/// - 200 OK: Site settings singleton
async fn get_site(State(state): State<SettingsRoutesState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.settings.get_site().await?))
}

/// Update the live broadcast state
///
/// # Request
/// - Method: PUT
/// - Path: /settings/site
/// - Headers: Authorization (god-mode required)
/// - Body: JSON with is_live, stream_title, stream_url
///
/// # Response
/// - 200 OK: New settings; change published to subscribers
/// - 403 Forbidden: Caller is not god-mode
async fn update_site(
    State(state): State<SettingsRoutesState>,
    god: GodUser,
    Json(input): Json<SiteSettingsInput>,
) -> ApiResult<impl IntoResponse> {
    let settings = state.settings.update_site(&input).await?;

    state
        .pubsub
        .publish(SettingsEvent::SiteSettingsChanged {
            settings: settings.clone(),
        })
        .await;

    tracing::info!(
        admin_id = %god.profile.id,
        is_live = settings.is_live,
        "Site settings updated"
    );

    Ok(Json(settings))
}

/// Operational flags
///
/// # Response
/// - 200 OK: System settings singleton
async fn get_system(State(state): State<SettingsRoutesState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.settings.get_system().await?))
}

/// Update the operational flags
///
/// # Request
/// - Method: PUT
/// - Path: /settings/system
/// - Headers: Authorization (god-mode required)
/// - Body: JSON with maintenance_mode and optional announcement
///
/// # Response
/// - 200 OK: New settings
/// - 403 Forbidden: Caller is not god-mode
async fn update_system(
    State(state): State<SettingsRoutesState>,
    god: GodUser,
    Json(input): Json<SystemSettingsInput>,
) -> ApiResult<impl IntoResponse> {
    let settings = state
        .settings
        .update_system(&input, god.profile.id)
        .await?;

    tracing::info!(
        admin_id = %god.profile.id,
        maintenance = settings.maintenance_mode,
        "System settings updated"
    );

    Ok(Json(settings))
}
