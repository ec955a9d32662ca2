//! Route table

use std::fmt;
use std::str::FromStr;

/// Every screen the client can show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`, always redirected to [`Route::Home`]
    Root,
    Login,
    Home,
    Dashboard,
    Historial,
    /// `/day-detail` or `/day-detail/:id`
    DayDetail(Option<String>),
    Mapa,
}

impl Route {
    /// Path as shown in the address bar
    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Home => "/home".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Historial => "/historial".to_string(),
            Route::DayDetail(None) => "/day-detail".to_string(),
            Route::DayDetail(Some(id)) => format!("/day-detail/{}", id),
            Route::Mapa => "/mapa".to_string(),
        }
    }

    /// Screens behind the auth guard
    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Historial)
    }

    /// Parse a path; `None` for anything outside the table.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim();
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_matches('/');

        let mut segments = trimmed.split('/');
        let first = segments.next().unwrap_or_default();
        let second = segments.next();
        if segments.next().is_some() {
            return None;
        }

        match (first, second) {
            ("", None) => Some(Route::Root),
            ("login", None) => Some(Route::Login),
            ("home", None) => Some(Route::Home),
            ("dashboard", None) => Some(Route::Dashboard),
            ("historial", None) => Some(Route::Historial),
            ("day-detail", None) => Some(Route::DayDetail(None)),
            ("day-detail", Some(id)) if !id.is_empty() => {
                let id = urlencoding::decode(id).ok()?.into_owned();
                Some(Route::DayDetail(Some(id)))
            }
            ("mapa", None) => Some(Route::Mapa),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Path outside the route table
#[derive(Debug, thiserror::Error)]
#[error("Unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s).ok_or_else(|| UnknownRoute(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        assert_eq!(Route::parse("/"), Some(Route::Root));
        assert_eq!(Route::parse(""), Some(Route::Root));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("home"), Some(Route::Home));
        assert_eq!(Route::parse("/dashboard/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/historial"), Some(Route::Historial));
        assert_eq!(Route::parse("/day-detail"), Some(Route::DayDetail(None)));
        assert_eq!(
            Route::parse("/day-detail/2025-11-10"),
            Some(Route::DayDetail(Some("2025-11-10".into())))
        );
        assert_eq!(Route::parse("/mapa?zoom=3"), Some(Route::Mapa));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Route::parse("/settings"), None);
        assert_eq!(Route::parse("/day-detail/a/b"), None);
        assert!("/nope".parse::<Route>().is_err());
    }

    #[test]
    fn test_path_roundtrip() {
        for route in [
            Route::Login,
            Route::Home,
            Route::Dashboard,
            Route::Historial,
            Route::DayDetail(None),
            Route::DayDetail(Some("2025-11-10".into())),
            Route::Mapa,
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn test_gated_routes() {
        assert!(Route::Dashboard.requires_auth());
        assert!(Route::Historial.requires_auth());
        assert!(!Route::Home.requires_auth());
        assert!(!Route::Mapa.requires_auth());
        assert!(!Route::DayDetail(None).requires_auth());
    }
}
