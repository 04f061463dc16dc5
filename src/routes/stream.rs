use rocket::{get, Shutdown, State};
use rocket::response::stream::EventStream;
use crate::config::ServerConfig;
use crate::registry::ConnectionRegistry;
use crate::session::Session;
use std::sync::Arc;

/// Long-lived event stream. Rocket's `EventStream` responder sets the
/// `text/event-stream` type plus no-cache and no-buffering headers.
#[get("/sse")]
pub fn sse(
    registry: &State<Arc<ConnectionRegistry>>,
    config: &State<ServerConfig>,
    shutdown: Shutdown,
) -> EventStream![] {
    Session::start(registry.inner().clone(), config.tick_interval).into_stream(shutdown)
}
