//! Navigation state and the auth guard

use std::sync::Mutex;
use tokio::sync::watch;

use super::route::Route;

/// Anything that can move the client to another screen
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Current screen plus the trail of visited routes
pub struct Router {
    current: watch::Sender<Route>,
    history: Mutex<Vec<Route>>,
}

impl Router {
    pub fn new() -> Self {
        let (current, _) = watch::channel(Route::Home);
        Self {
            current,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Route {
        self.current.borrow().clone()
    }

    /// Watch route changes
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }

    /// Routes navigated to, oldest first
    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Where a request for `route` actually lands.
    ///
    /// `/` goes home; gated routes go to `/login` without a live session.
    pub fn resolve(route: Route, authenticated: bool) -> Route {
        match route {
            Route::Root => Route::Home,
            r if r.requires_auth() && !authenticated => Route::Login,
            r => r,
        }
    }

    /// Guarded navigation by path. Unknown paths land on `/home`.
    pub fn open(&self, path: &str, authenticated: bool) -> Route {
        let requested = Route::parse(path).unwrap_or_else(|| {
            tracing::debug!(path, "Unknown route, redirecting home");
            Route::Home
        });

        let target = Self::resolve(requested.clone(), authenticated);
        if target != requested {
            tracing::info!(requested = %requested, target = %target, "Route redirected");
        }

        self.navigate(target.clone());
        target
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for Router {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "Navigating");
        if let Ok(mut history) = self.history.lock() {
            history.push(route.clone());
        }
        self.current.send_replace(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_redirects_home() {
        let router = Router::new();
        assert_eq!(router.open("/", false), Route::Home);
        assert_eq!(router.current(), Route::Home);
    }

    #[test]
    fn test_guard_blocks_without_session() {
        let router = Router::new();
        assert_eq!(router.open("/dashboard", false), Route::Login);
        assert_eq!(router.open("/historial", false), Route::Login);
        assert_eq!(router.current(), Route::Login);
    }

    #[test]
    fn test_guard_allows_with_session() {
        let router = Router::new();
        assert_eq!(router.open("/dashboard", true), Route::Dashboard);
        assert_eq!(router.open("/mapa", false), Route::Mapa);
        assert_eq!(router.history(), vec![Route::Dashboard, Route::Mapa]);
    }

    #[test]
    fn test_unknown_path_goes_home() {
        let router = Router::new();
        assert_eq!(router.open("/nowhere", true), Route::Home);
    }

    #[tokio::test]
    async fn test_subscribers_see_navigation() {
        let router = Router::new();
        let mut rx = router.subscribe();
        router.navigate(Route::Mapa);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Route::Mapa);
    }
}
