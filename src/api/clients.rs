use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::{auth::require_platform_admin, session::AppState};
use crate::api::NotFoundTemplate;
use crate::db::DataError;
use crate::models::client::{
    validate_pin, validate_slug, Client, CreateClientData, UpdateClientData,
};

#[derive(Debug)]
pub enum ClientsError {
    DataError(DataError),
    NotFound,
}

impl IntoResponse for ClientsError {
    fn into_response(self) -> Response {
        match self {
            ClientsError::DataError(e) => {
                tracing::error!(error = %e, "Data service error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The operation failed, please try again".to_string(),
                )
                    .into_response()
            }
            ClientsError::NotFound => (
                StatusCode::NOT_FOUND,
                NotFoundTemplate::new("Client not found"),
            )
                .into_response(),
        }
    }
}

#[derive(Template)]
#[template(path = "admin/clients.html")]
struct ClientsTemplate {
    clients: Vec<Client>,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/client_edit.html")]
struct EditClientTemplate {
    client: Client,
    error: Option<String>,
}

async fn admin_home() -> Redirect {
    Redirect::to("/admin/clients")
}

/// List all clients
async fn list_clients(State(state): State<AppState>) -> Result<ClientsTemplate, ClientsError> {
    let clients = Client::list(&state.data)
        .await
        .map_err(ClientsError::DataError)?;

    Ok(ClientsTemplate {
        clients,
        error: None,
    })
}

#[derive(Deserialize)]
struct CreateClientForm {
    name: String,
    slug: String,
    admin_pin: String,
    staff_pin: String,
}

fn validate_new_client(form: &CreateClientForm) -> Result<CreateClientData, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Business name is required".to_string());
    }
    let slug = form.slug.trim().to_lowercase();
    validate_slug(&slug)?;

    let admin_pin = form.admin_pin.trim();
    let staff_pin = form.staff_pin.trim();
    validate_pin(admin_pin)?;
    validate_pin(staff_pin)?;
    if admin_pin == staff_pin {
        return Err("Admin and staff PINs must differ".to_string());
    }

    Ok(CreateClientData {
        slug,
        name: name.to_string(),
        admin_pin: admin_pin.to_string(),
        staff_pin: staff_pin.to_string(),
    })
}

/// Create a new client
async fn create_client(
    State(state): State<AppState>,
    Form(form): Form<CreateClientForm>,
) -> Result<Response, ClientsError> {
    let rejected = |message: String, clients: Vec<Client>| {
        (
            StatusCode::BAD_REQUEST,
            ClientsTemplate {
                clients,
                error: Some(message),
            },
        )
            .into_response()
    };

    let data = match validate_new_client(&form) {
        Ok(data) => data,
        Err(message) => {
            let clients = Client::list(&state.data)
                .await
                .map_err(ClientsError::DataError)?;
            return Ok(rejected(message, clients));
        }
    };

    let existing = Client::find_by_slug(&state.data, &data.slug)
        .await
        .map_err(ClientsError::DataError)?;
    if existing.is_some() {
        let clients = Client::list(&state.data)
            .await
            .map_err(ClientsError::DataError)?;
        return Ok(rejected(
            format!("Slug {} is already taken", data.slug),
            clients,
        ));
    }

    let client = Client::create(&state.data, data)
        .await
        .map_err(ClientsError::DataError)?;

    tracing::info!(client_id = %client.id, slug = %client.slug, "Created client");

    Ok(Redirect::to("/admin/clients").into_response())
}

/// Show edit form
async fn edit_client_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<EditClientTemplate, ClientsError> {
    let client = Client::find_by_id(&state.data, id)
        .await
        .map_err(ClientsError::DataError)?
        .ok_or(ClientsError::NotFound)?;

    Ok(EditClientTemplate {
        client,
        error: None,
    })
}

#[derive(Deserialize)]
struct UpdateClientForm {
    name: Option<String>,
    admin_pin: Option<String>,
    staff_pin: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_update(form: UpdateClientForm, current: &Client) -> Result<UpdateClientData, String> {
    let data = UpdateClientData {
        name: non_empty(form.name).filter(|name| *name != current.name),
        admin_pin: non_empty(form.admin_pin),
        staff_pin: non_empty(form.staff_pin),
    };

    if let Some(pin) = &data.admin_pin {
        validate_pin(pin)?;
    }
    if let Some(pin) = &data.staff_pin {
        validate_pin(pin)?;
    }

    let admin_pin = data.admin_pin.as_deref().unwrap_or(&current.admin_pin);
    let staff_pin = data.staff_pin.as_deref().unwrap_or(&current.staff_pin);
    if admin_pin == staff_pin {
        return Err("Admin and staff PINs must differ".to_string());
    }

    Ok(data)
}

/// Update an existing client
async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<UpdateClientForm>,
) -> Result<Response, ClientsError> {
    let client = Client::find_by_id(&state.data, id)
        .await
        .map_err(ClientsError::DataError)?
        .ok_or(ClientsError::NotFound)?;

    let data = match validate_update(form, &client) {
        Ok(data) => data,
        Err(message) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                EditClientTemplate {
                    client,
                    error: Some(message),
                },
            )
                .into_response());
        }
    };

    Client::update(&state.data, id, data)
        .await
        .map_err(ClientsError::DataError)?
        .ok_or(ClientsError::NotFound)?;

    tracing::info!(client_id = %id, "Updated client");

    Ok(Redirect::to("/admin/clients").into_response())
}

/// Hard-deletes a client
async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ClientsError> {
    let removed = Client::delete(&state.data, id)
        .await
        .map_err(ClientsError::DataError)?;

    if !removed {
        return Err(ClientsError::NotFound);
    }

    tracing::info!(client_id = %id, "Deleted client");

    Ok(Redirect::to("/admin/clients"))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_home))
        .route("/admin/clients", get(list_clients).post(create_client))
        .route("/admin/clients/:id/edit", get(edit_client_form))
        .route("/admin/clients/:id", post(update_client))
        .route("/admin/clients/:id/delete", post(delete_client))
        .route_layer(middleware::from_fn_with_state(state, require_platform_admin))
}
