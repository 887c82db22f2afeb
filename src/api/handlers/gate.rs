use crate::gate::Dispatcher;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Form,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

/// Form payload carrying the value to dispatch.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct GateForm {
    value: String,
}

#[utoipa::path(
    post,
    path= "/gate/{gate_number}",
    params(
        ("gate_number" = u32, Path, description = "Numeric suffix kept from the legacy surface, accepted for any route match")
    ),
    request_body(content = GateForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 200, description = "Dispatch completed, one `value => message` line", body = String, content_type = "text/plain"),
        (status = 502, description = "Gate could not be reached")
    ),
    tag = "gate",
)]
// The numeric suffix names the route only. Gate selection happens inside the
// dispatcher, one random pick per request.
#[instrument(skip(dispatcher, form))]
pub async fn gate(
    Path(gate_number): Path<u32>,
    Extension(dispatcher): Extension<Dispatcher>,
    Form(form): Form<GateForm>,
) -> impl IntoResponse {
    info!(gate_number, value_len = form.value.len(), "dispatching value");

    match dispatcher.dispatch(&form.value).await {
        Ok(result) => (StatusCode::OK, format!("{result}\n")),
        Err(err) => {
            error!("dispatch failed: {err}");
            (StatusCode::BAD_GATEWAY, format!("{err}\n"))
        }
    }
}
