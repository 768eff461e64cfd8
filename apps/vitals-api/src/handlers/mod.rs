//! Handlers 模块

pub mod alerts;
pub mod auth;
pub mod dashboard;
pub mod metrics;
pub mod pairing;
pub mod profile;
pub mod readings;

pub use alerts::*;
pub use auth::*;
pub use dashboard::*;
pub use metrics::*;
pub use pairing::*;
pub use profile::*;
pub use readings::*;
