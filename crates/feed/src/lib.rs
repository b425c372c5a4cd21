pub mod poller;
pub mod rest;

pub use poller::{DashboardSnapshot, Poller, PollerCommand, PollerHandle};
pub use rest::VerdictClient;
