//! Application shell
//!
//! Route table, navigation state with the auth guard, and user alerts.

mod notify;
mod route;
mod router;

pub use notify::{ConsoleNotifier, Notifier};
pub use route::{Route, UnknownRoute};
pub use router::{Navigator, Router};
