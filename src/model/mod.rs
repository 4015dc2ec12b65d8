pub mod connection;
pub mod graph;
pub mod node;

pub use connection::*;
pub use graph::*;
pub use node::*;
