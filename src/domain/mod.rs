// Domain layer: models and ports (transport, storage).

pub mod model;
pub mod ports;
