// Domain layer: models, cash-flow categories and the ports the pipeline depends on.

pub mod category;
pub mod model;
pub mod ports;
