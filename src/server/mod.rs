pub mod guards;
pub mod ratelimit;
pub mod router;
pub mod routes;

pub use router::{LaunchpadState, launchpad_router};
