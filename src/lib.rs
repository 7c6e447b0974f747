pub mod camera;
pub mod config;
pub mod handle_user_input;
pub mod parameters;
pub mod render_system;
pub mod session;
pub mod world;
