// Domain layer: search models and ports (interfaces) for the catalog and config.

pub mod model;
pub mod ports;
