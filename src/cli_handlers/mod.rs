// CLI command handlers: serve (web console), status, show, doctor

pub mod console;
pub mod doctor_command;
pub mod status_command;

pub use console::handle_serve_command;
pub use doctor_command::handle_doctor_command;
pub use status_command::{handle_show, handle_status};
