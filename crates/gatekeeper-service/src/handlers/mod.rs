//! HTTP request handlers for the Gatekeeper service.

pub mod admin;
pub mod health;
pub mod lebowski;
pub mod me;
pub mod metrics;

pub use admin::list_identities;
pub use health::health_check;
pub use lebowski::the_dude_abides;
pub use me::get_me;
pub use metrics::metrics_handler;
