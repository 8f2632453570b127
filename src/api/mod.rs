pub mod services;

pub use services::redirect::redirect_routes;
pub use services::shorten::shorten_routes;
