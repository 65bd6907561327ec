#![forbid(unsafe_code)]
mod dialect;
mod error;
mod paging;
mod placeholder;
mod scan;

pub use dialect::Dialect;
pub use error::QueryError;
pub use paging::{apply_paging, Page};
pub use placeholder::positional;
pub use scan::{Scanner, Token, TokenKind};
