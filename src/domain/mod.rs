// Domain layer: request/response models and the notification service port.

pub mod model;
pub mod ports;
