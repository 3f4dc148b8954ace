mod expiration;
mod registry;

pub use expiration::{Countdown, ExpirationEngine, OpenCheck, TickOutcome};
pub use registry::ConsumedRegistry;

use std::sync::{Arc, Mutex};

/// One engine instance is shared by every viewer the host opens (and by the
/// countdown driver task, when one is running).
pub type SharedEngine = Arc<Mutex<ExpirationEngine>>;

/// Wrap an engine for sharing between controllers and a driver.
pub fn shared(engine: ExpirationEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}
