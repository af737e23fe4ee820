//! Configuration types and TOML loading.

mod settings;

pub use settings::{BusConfig, ConciergeConfig, CoordinatorConfig, RouterConfig};
