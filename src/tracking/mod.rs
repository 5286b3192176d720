pub mod poller;
pub mod position;
pub mod session;
pub mod simulator;
pub mod subscriber;
pub mod view;
