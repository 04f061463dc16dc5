use rocket::{post, serde::json::Json, State, http::Status};
use crate::broadcast::Broadcaster;
use crate::error::BroadcastError;
use crate::models::{BroadcastRequest, BroadcastResponse};

#[post("/broadcast", data = "<body>")]
pub fn broadcast(
    body: Json<BroadcastRequest>,
    broadcaster: &State<Broadcaster>,
) -> Result<Json<BroadcastResponse>, (Status, Json<serde_json::Value>)> {
    let message = body.into_inner().message.unwrap_or(serde_json::Value::Null);

    let clients_count = broadcaster.broadcast(message).map_err(error_response)?;

    Ok(Json(BroadcastResponse {
        success: true,
        clients_count,
    }))
}

fn error_response(e: BroadcastError) -> (Status, Json<serde_json::Value>) {
    let (status, code) = match e {
        BroadcastError::EmptyMessage => (Status::BadRequest, "EMPTY_MESSAGE"),
        BroadcastError::Encode(_) => (Status::InternalServerError, "INTERNAL_ERROR"),
    };
    (status, Json(serde_json::json!({
        "error": e.to_string(),
        "code": code
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_is_a_client_error() {
        let (status, body) = error_response(BroadcastError::EmptyMessage);
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body.0["code"], "EMPTY_MESSAGE");
        assert!(body.0["error"].is_string());
    }

    #[test]
    fn encode_failure_is_a_server_error() {
        let (status, body) = error_response(BroadcastError::Encode("boom".into()));
        assert_eq!(status, Status::InternalServerError);
        assert_eq!(body.0["code"], "INTERNAL_ERROR");
        assert!(body.0["error"].as_str().unwrap().contains("boom"));
    }
}
