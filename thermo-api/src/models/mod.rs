mod command;
mod device;
mod notification;

pub use command::*;
pub use device::*;
pub use notification::*;
