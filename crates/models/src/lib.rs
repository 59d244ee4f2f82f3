pub mod error;
pub mod filters;
pub mod fixture;
pub mod matches;
pub mod odds;

pub use error::*;
pub use filters::*;
pub use fixture::*;
pub use matches::*;
pub use odds::*;
