//! Repair of strategy records coming from the Verdict backend.
//!
//! The backend feed is untrusted: references may point at unknown oracle
//! ids, values may be missing, and resolution logic may be absent. The
//! `StrategyValidator` turns any such record into one the dashboard can
//! render, using a `DataSourceRegistry` of trusted feeds.

pub mod config;
pub mod registry;
pub mod templates;
pub mod validator;

pub use config::{parse_price, DataSource, DataSourceFile};
pub use registry::{DataSourceRegistry, RegistryError};
pub use templates::{format_target, math_template, MATH_TEMPLATES};
pub use validator::{FixedReference, RepairStats, StrategyValidator};
