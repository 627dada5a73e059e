//! HTTP surface of the dashboard: the JSON API the pages hydrate from.

mod routes;

pub use routes::api_routes;
