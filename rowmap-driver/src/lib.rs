#![forbid(unsafe_code)]

mod command;
mod connection;
mod error;
mod row;
mod value;

#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use command::*;
pub use connection::*;
pub use error::*;
pub use row::*;
pub use rowmap_query::Dialect;
pub use value::*;

#[cfg(feature = "memory")]
pub use memory::*;
#[cfg(feature = "sqlite")]
pub use sqlite::*;
