pub mod contact;
pub mod strategy;

pub use contact::ContactRequestDetector;
pub use strategy::SpamStrategy;
