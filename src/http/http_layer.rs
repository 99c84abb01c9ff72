// The http module adapts the core services to the JSON API the front-end
// calls. No table logic lives here.

pub mod responses;
pub mod routes;
