// Adapters layer: concrete NotificationService implementations.

pub mod memory;
pub mod sns;

pub use memory::InMemoryNotificationService;
pub use sns::SnsNotificationService;
