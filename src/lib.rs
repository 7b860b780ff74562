pub mod alloc;
pub mod error;
pub mod fabric;
pub mod flow;
pub mod net;
pub mod sim;
pub mod topo;

pub use error::SimError;

#[cfg(test)]
mod test;
