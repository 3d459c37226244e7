//! Price feed implementations

pub mod sim;

pub use sim::SimulatedFeed;
