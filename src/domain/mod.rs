// Domain layer: core models, settings and ports (interfaces). Depends only on serde/chrono, async-trait and the crate error type.

pub mod model;
pub mod ports;
pub mod settings;
