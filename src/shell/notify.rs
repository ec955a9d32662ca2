//! Blocking alerts shown to the user

/// Where alert messages end up
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Prints alerts to stderr, like a modal would interrupt a page
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        eprintln!("! {}", message);
    }
}
