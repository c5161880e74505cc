#[cfg(test)]
#[path = "navigation_test.rs"]
mod tests;

use super::SessionStore;
use crate::domain::models::Navigation;
use crate::domain::models::Route;
use crate::domain::models::RouteMatch;
use crate::domain::models::RouteMeta;
use crate::domain::models::RouteName;

/// Where signed in users land when they open a page meant for guests.
pub const LANDING_PATH: &str = "/";

pub fn routes() -> Vec<Route> {
    let open = RouteMeta::default();
    let guests_only = RouteMeta {
        hide_for_auth: true,
    };

    return vec![
        Route {
            name: RouteName::Home,
            path: "/",
            meta: open,
        },
        Route {
            name: RouteName::TodoList,
            path: "/todos",
            meta: open,
        },
        Route {
            name: RouteName::TodoDetail,
            path: "/todo/:id",
            meta: open,
        },
        Route {
            name: RouteName::Login,
            path: "/login",
            meta: guests_only,
        },
        Route {
            name: RouteName::Register,
            path: "/register",
            meta: guests_only,
        },
    ];
}

fn segments(path: &str) -> Vec<&str> {
    return path
        .split('/')
        .filter(|segment| return !segment.is_empty())
        .collect();
}

pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Router {
        return Router { routes: routes() };
    }
}

impl Router {
    /// Matches a path against the route table. Query strings and fragments are
    /// ignored, the `:id` segment is captured verbatim.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let path = path
            .split(|c: char| return c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        let wanted = segments(path);

        for route in self.routes.iter() {
            let pattern = segments(route.path);
            if pattern.len() != wanted.len() {
                continue;
            }

            let mut id = None;
            let matched = pattern.iter().zip(wanted.iter()).all(|(expected, actual)| {
                if expected.starts_with(':') {
                    id = Some(actual.to_string());
                    return true;
                }
                return expected == actual;
            });

            if matched {
                return Some(RouteMatch {
                    route: *route,
                    path: format!("/{}", wanted.join("/")),
                    id,
                });
            }
        }

        return None;
    }

    /// Runs before every transition. Session state is reloaded from storage
    /// first so a login made by another run is honoured.
    pub fn guard(&self, target: RouteMatch, session: &SessionStore) -> Navigation {
        session.restore();

        if target.route.meta.hide_for_auth && session.is_authenticated() {
            tracing::debug!(route = %target.route.name, "Redirecting signed in user");
            return Navigation::Redirect(LANDING_PATH.to_string());
        }

        return Navigation::Proceed(target);
    }

    pub fn navigate(&self, path: &str, session: &SessionStore) -> Option<Navigation> {
        let target = self.resolve(path)?;
        return Some(self.guard(target, session));
    }
}
