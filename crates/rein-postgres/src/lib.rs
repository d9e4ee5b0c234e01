//! PostgreSQL constraint host for rein.

pub mod options;
pub mod postgres;

pub use options::ApplyOptions;
pub use postgres::{PostgresHost, list_present_constraints};

pub use rein_plan::{ConstraintHost, HostError};
