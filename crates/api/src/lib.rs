pub mod error;
pub mod routes;

pub use error::*;
pub use routes::*;
