//! Refresh scheduling
//!
//! One poller actor per monitored entity: the fleet poller keeps the server
//! list current, a server poller keeps one server's detail view current. Each
//! actor owns its interval timer and publishes whole-snapshot replacements
//! over a watch channel; a typed handle controls it over mpsc. Dropping the
//! handle (or sending shutdown) tears the timer down with it.

mod fleet;
mod messages;
mod server;

pub use fleet::FleetPollerHandle;
pub use messages::{FleetSnapshot, PollerCommand, ServerSnapshot};
pub use server::ServerPollerHandle;
