use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};

use super::lang::{lang_cookie, Lang};
use super::server::AppState;
use super::views;
use crate::error::{Result, TwintailError};
use crate::i18n::Translator;
use crate::requests::{
    validate_service_name, EndpointForm, StoreServiceForm, UpdateEndpointForm, UpdateSettingsForm,
};
use crate::log_error;
use crate::serve::ServeManager;

/// Query string of the endpoint edit/delete links.
#[derive(Debug, Default, Deserialize)]
pub struct EndpointQuery {
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub destination: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub tailscale_installed: bool,
}

/// Run a blocking translator call off the async runtime.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&ServeManager) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let manager = state.manager.clone();
    tokio::task::spawn_blocking(move || f(&manager))
        .await
        .unwrap_or_else(|e| Err(TwintailError::Io(std::io::Error::other(e))))
}

/// Page for a translator failure that is not handled inline.
fn error_response(t: Translator<'_>, err: &TwintailError) -> Response {
    if err.is_not_installed() {
        return views::not_installed(t).into_response();
    }
    log_error!(err, err.to_error_code());
    (StatusCode::INTERNAL_SERVER_ERROR, views::error_page(t, &err.to_string())).into_response()
}

fn not_found_response(t: Translator<'_>) -> Response {
    (StatusCode::NOT_FOUND, views::not_found(t)).into_response()
}

/// Reject a `:name` segment that could not have come from a valid service.
fn check_name(t: Translator<'_>, name: &str) -> std::result::Result<(), Response> {
    validate_service_name(name).map_err(|e| {
        tracing::warn!(name, error = %e, "Rejected service name in path");
        (
            StatusCode::BAD_REQUEST,
            views::error_page(t, &views::validation_message(t, &e)),
        )
            .into_response()
    })
}

async fn require_installed(state: &AppState, t: Translator<'_>) -> std::result::Result<(), Response> {
    blocking(state, |m| m.check_installed())
        .await
        .map_err(|e| error_response(t, &e))
}

fn redirect_to_service(name: &str) -> Response {
    Redirect::to(&views::service_path(name)).into_response()
}

/// `GET /`
pub async fn index(State(state): State<AppState>, Lang(lang): Lang) -> Response {
    let t = state.i18n.translator(lang);
    match blocking(&state, |m| m.get_serve_status()).await {
        Ok(services) => views::index(t, &services).into_response(),
        Err(e) => error_response(t, &e),
    }
}

/// `GET /services/new`
pub async fn new_service(State(state): State<AppState>, Lang(lang): Lang) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = require_installed(&state, t).await {
        return resp;
    }
    views::new_service(t, &StoreServiceForm::with_defaults(), None).into_response()
}

/// `POST /services/new`
pub async fn store_service(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Form(form): Form<StoreServiceForm>,
) -> Response {
    let t = state.i18n.translator(lang);
    let params = match form.validate() {
        Ok(params) => params,
        Err(e) => {
            let message = views::validation_message(t, &e);
            return views::new_service(t, &form, Some(&message)).into_response();
        },
    };

    let name = params.service_name.clone();
    match blocking(&state, move |m| m.advertise_service(&params)).await {
        Ok(()) => redirect_to_service(&name),
        Err(e) => views::new_service(t, &form, Some(&e.to_string())).into_response(),
    }
}

/// `GET /services/:name`
pub async fn show_service(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    match blocking(&state, move |m| m.get_service_by_name(&name)).await {
        Ok(Some(detail)) => views::show_service(t, &detail).into_response(),
        Ok(None) => not_found_response(t),
        Err(e) => error_response(t, &e),
    }
}

/// `GET /services/:name/delete`
pub async fn delete_service(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    match blocking(&state, move |m| m.get_service_by_name(&name)).await {
        Ok(Some(detail)) => views::confirm_delete_service(t, &detail).into_response(),
        Ok(None) => not_found_response(t),
        Err(e) => error_response(t, &e),
    }
}

/// `POST /services/:name/delete`
pub async fn destroy_service(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    match blocking(&state, move |m| m.clear_service(&name)).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => error_response(t, &e),
    }
}

/// `GET /services/:name/endpoints/new`
pub async fn new_endpoint(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = require_installed(&state, t).await {
        return resp;
    }
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    views::new_endpoint(t, &name, &EndpointForm::with_defaults(), None).into_response()
}

/// `POST /services/:name/endpoints/new`
pub async fn store_endpoint(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
    Form(form): Form<EndpointForm>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    let params = match form.validate(&name) {
        Ok(params) => params,
        Err(e) => {
            let message = views::validation_message(t, &e);
            return views::new_endpoint(t, &name, &form, Some(&message)).into_response();
        },
    };

    match blocking(&state, move |m| m.add_endpoint(&params)).await {
        Ok(()) => redirect_to_service(&name),
        Err(e) => views::new_endpoint(t, &name, &form, Some(&e.to_string())).into_response(),
    }
}

/// `GET /services/:name/endpoints/delete`
pub async fn delete_endpoint(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
    Query(query): Query<EndpointQuery>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = require_installed(&state, t).await {
        return resp;
    }
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    let form = EndpointForm {
        protocol: query.protocol,
        expose_port: query.port,
        destination: query.destination,
    };
    views::confirm_delete_endpoint(t, &name, &form).into_response()
}

/// `POST /services/:name/endpoints/delete`
///
/// Redirects to the service page, or to the list when the removal took the
/// last endpoint and the service with it.
pub async fn destroy_endpoint(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
    Form(form): Form<EndpointForm>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    let params = match form.validate(&name) {
        Ok(params) => params,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                views::error_page(t, &views::validation_message(t, &e)),
            )
                .into_response()
        },
    };

    if let Err(e) = blocking(&state, move |m| m.remove_endpoint(&params)).await {
        return error_response(t, &e);
    }

    let lookup = name.clone();
    match blocking(&state, move |m| m.get_service_by_name(&lookup)).await {
        Ok(Some(_)) => redirect_to_service(&name),
        Ok(None) => Redirect::to("/").into_response(),
        Err(e) => {
            tracing::warn!(service = %name, error = %e, "Could not re-read service after endpoint removal");
            Redirect::to("/").into_response()
        },
    }
}

/// `GET /services/:name/endpoints/edit`
pub async fn edit_endpoint(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
    Query(query): Query<EndpointQuery>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = require_installed(&state, t).await {
        return resp;
    }
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    let form = UpdateEndpointForm {
        protocol: query.protocol,
        expose_port: query.port,
        old_destination: query.destination.clone(),
        new_destination: query.destination,
    };
    views::edit_endpoint(t, &name, &form, None, false).into_response()
}

/// `POST /services/:name/endpoints/edit`
pub async fn update_endpoint(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Path(name): Path<String>,
    Form(form): Form<UpdateEndpointForm>,
) -> Response {
    let t = state.i18n.translator(lang);
    if let Err(resp) = check_name(t, &name) {
        return resp;
    }
    let params = match form.validate(&name) {
        Ok(params) => params,
        Err(e) => {
            let message = views::validation_message(t, &e);
            return views::edit_endpoint(t, &name, &form, Some(&message), false).into_response();
        },
    };

    match blocking(&state, move |m| m.update_endpoint(&params)).await {
        Ok(()) => redirect_to_service(&name),
        Err(e) => {
            let message = e
                .command_error()
                .map(|c| c.to_string())
                .unwrap_or_else(|| e.to_string());
            views::edit_endpoint(t, &name, &form, Some(&message), e.is_partial_update()).into_response()
        },
    }
}

/// `GET /settings`
pub async fn show_settings(State(state): State<AppState>, Lang(lang): Lang) -> Response {
    views::settings(state.i18n.translator(lang)).into_response()
}

/// `POST /settings`
pub async fn update_settings(Form(form): Form<UpdateSettingsForm>) -> Response {
    match form.validate() {
        Ok(lang) => (
            [(header::SET_COOKIE, lang_cookie(lang))],
            Redirect::to("/settings"),
        )
            .into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid settings update");
            Redirect::to("/settings").into_response()
        },
    }
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let installed = blocking(&state, |m| m.check_installed()).await.is_ok();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "twintail".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tailscale_installed: installed,
    })
}

/// Fallback for unknown routes
pub async fn not_found(State(state): State<AppState>, Lang(lang): Lang) -> Response {
    not_found_response(state.i18n.translator(lang))
}
