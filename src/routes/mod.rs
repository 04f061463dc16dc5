// Route modules. Each one is a thin adapter over the session, broadcaster
// and registry managed in Rocket state.

mod publish;
mod stream;
mod system;

pub use publish::broadcast;
pub use stream::sse;
pub use system::health;
