pub mod change_feed;
pub mod dispatch;
pub mod filter_store;
pub mod highlight;
pub mod match_store;
pub mod scheduler;
pub mod selectors;

pub use change_feed::*;
pub use dispatch::*;
pub use filter_store::*;
pub use highlight::*;
pub use match_store::*;
pub use scheduler::*;
pub use selectors::*;
