pub mod attendance;

pub mod system;

pub use attendance::configure_attendance_routes;
pub use system::configure_system_routes;
