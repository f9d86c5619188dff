mod message;
mod policy;
mod room;

pub use message::*;
pub use policy::*;
pub use room::*;

pub extern crate serde;
pub extern crate serde_json;
