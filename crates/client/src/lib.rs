mod error;
mod rpc;
mod substrate;

pub use error::*;
pub use rpc::*;
pub use substrate::*;
