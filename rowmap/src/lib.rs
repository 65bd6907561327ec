#![forbid(unsafe_code)]

mod args;
mod binder;
mod config;
mod convert;
mod error;
mod event_bus;
mod mapper;
mod record;

pub use args::{ArgField, Args, Bind, Params};
pub use binder::Binder;
pub use config::*;
pub use convert::{CoerceError, FromValue, ToValue};
pub use error::{BindError, Error, Result};
pub use event_bus::*;
pub use mapper::{Mapper, NonQuery, Query};
pub use record::{materialize, Record};

pub use rowmap_driver as driver;
pub use rowmap_driver::{
    Command, CommandKind, Connection, Dialect, Direction, DriverError, Executed, Kind, Outputs,
    Parameter, Provider, Reader, Row, Value,
};
pub use rowmap_macro::{Args, Record};
pub use rowmap_query::{apply_paging, Page};

#[cfg(feature = "memory")]
pub use rowmap_driver::{MemoryConnection, MemoryDriver, ResultSet, Script};
#[cfg(feature = "sqlite")]
pub use rowmap_driver::{SqliteConnection, SqliteProvider};
