//! Domain layer - core business logic and entities

pub mod pool;
