pub mod location;
pub mod order;
