//! Static responder for the gallery: serves the public directory the bot
//! writes into and the site's static assets. No business logic lives here.

pub mod api;
pub mod error;

pub use api::{build_router, serve, WebState};
