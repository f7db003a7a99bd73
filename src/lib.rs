pub mod campaigns;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod integrations;
mod patches;
pub mod pricing;
pub mod referral;
pub mod server;
pub mod site;
pub mod utils;

pub use error::LaunchpadError;
pub use server::{LaunchpadState, launchpad_router};
