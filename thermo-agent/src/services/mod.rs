mod command_dispatcher;
mod reporting_service;

pub use command_dispatcher::*;
pub use reporting_service::*;
