// Domain layer: core models, settings shared by every config source, and ports.

pub mod model;
pub mod ports;
pub mod settings;
