pub mod directions;
pub mod order_service;
