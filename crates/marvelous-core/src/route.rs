//! Page table: the three views and their titles.

/// Title used when no route matches.
pub const APP_TITLE: &str = "Marvel Series";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Detail(u64),
    History,
}

impl Route {
    /// Resolve a path such as `/`, `/detail/354` or `/history`.
    pub fn resolve(path: &str) -> Option<Self> {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Self::Home),
            ["history"] => Some(Self::History),
            ["detail", id] => id.parse().ok().map(Self::Detail),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Detail(_) => "detail",
            Self::History => "history",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home - Marvel Series",
            Self::Detail(_) => "Series Detail",
            Self::History => "History",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Detail(id) => format!("/detail/{id}"),
            Self::History => "/history".to_string(),
        }
    }
}

/// Window/document title for a navigation target.
pub fn document_title(route: Option<&Route>) -> &'static str {
    route.map(Route::title).unwrap_or(APP_TITLE)
}
