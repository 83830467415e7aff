mod address;
mod babe;
mod digest;
mod era;
mod error;
mod hashing;
mod metadata;
mod reader;
mod registry;
mod ss58;
mod value;

pub use address::*;
pub use babe::*;
pub use digest::*;
pub use era::*;
pub use error::*;
pub use hashing::*;
pub use metadata::*;
pub use reader::*;
pub use registry::*;
pub use ss58::*;
pub use value::*;
