pub mod error_response;
pub mod parameter_error_handler;
pub mod password;
pub mod validate;

pub use error_response::error_response;
pub use parameter_error_handler::{json_error_handler, path_error_handler, query_error_handler};
