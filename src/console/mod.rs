//! Server-rendered web console over the serve translator.

pub mod assets;
pub mod handlers;
pub mod lang;
pub mod routes;
pub mod server;
pub mod views;

pub use server::{create_router, AppState, ConsoleServer};
