mod audit;
mod block;
mod event;
mod extrinsic;
mod log;
mod runtime;
mod session;
mod totals;
mod transfer;

pub use audit::*;
pub use block::*;
pub use event::*;
pub use extrinsic::*;
pub use log::*;
pub use runtime::*;
pub use session::*;
pub use totals::*;
pub use transfer::*;
