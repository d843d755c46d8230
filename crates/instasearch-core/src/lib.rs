pub mod aggregation;
pub mod cache;
pub mod client;
pub mod clock;
pub mod events;
pub mod filters;
pub mod interceptor;
pub mod models;
pub mod options;
pub mod sqlite;
pub mod transport;
