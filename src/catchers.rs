use log::error;
use rocket::catch;
use rocket::serde::json::Json;
use rocket::Request;

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "error": "Bad request. Send a JSON body such as {\"message\": \"hello\"}.",
        "code": "BAD_REQUEST"
    }))
}

#[catch(404)]
pub fn not_found(req: &Request) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "error": format!("No route for {} {}", req.method(), req.uri().path()),
        "code": "NOT_FOUND"
    }))
}

#[catch(422)]
pub fn unprocessable_entity(_req: &Request) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "error": "Unprocessable entity. The body must be a JSON object with a \"message\" field.",
        "code": "UNPROCESSABLE_ENTITY"
    }))
}

#[catch(500)]
pub fn internal_error(req: &Request) -> Json<serde_json::Value> {
    error!("Internal error handling {} {}", req.method(), req.uri());
    Json(serde_json::json!({
        "error": "Internal server error",
        "code": "INTERNAL_ERROR"
    }))
}
