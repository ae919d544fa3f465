#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

pub mod commit;
pub mod config;
pub mod diff;
pub mod error;
pub mod hash;
pub mod index;
pub mod io;
pub mod lockfile;
pub mod obj;
pub mod odb;
pub mod pack;
pub mod path;
pub mod protocol;
pub mod reachability;
pub mod repo;
pub mod status;
pub mod time;
pub mod transport;
pub mod tree;

pub use error::{GritError, GritResult};
pub use hash::Oid;
pub use repo::Repository;
