// Domain layer: models and ports. Adapters implement the ports for the real OS.

pub mod model;
pub mod ports;
