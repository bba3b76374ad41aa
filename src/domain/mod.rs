// Domain layer: models and ports. Storage and tenant switching live behind the traits.

pub mod model;
pub mod ports;
