use strum::EnumIter;
use strum::EnumVariantNames;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
pub enum RouteName {
    Home,
    TodoList,
    TodoDetail,
    Login,
    Register,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    /// Signed in users are sent elsewhere when they try to open this route.
    pub hide_for_auth: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub name: RouteName,
    pub path: &'static str,
    pub meta: RouteMeta,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: Route,
    pub path: String,
    /// Value of the `:id` segment, handed to the page as-is.
    pub id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Proceed(RouteMatch),
    Redirect(String),
}
