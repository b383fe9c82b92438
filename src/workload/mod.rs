//! Converts MapReduce application names to actual application code.
//!
//! # Example
//!
//! ```
//! # use anyhow::Result;
//! use pagecounts::workload;
//! # fn main() -> Result<()> {
//! let most_visited = workload::named("most-visited")?;
//! # Ok(())
//! # }
//! ```

use crate::Workload;
use anyhow::{bail, Result};

pub mod most_visited;

/// Gets the [`Workload`] named `name`.
///
/// Returns [`None`] if no application with the given name was found.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "most-visited" => Some(Workload {
            name: "most-visited",
            map_fn: most_visited::map,
            reducer_fn: most_visited::reducer,
            single_reducer: true,
        }),
        _ => None,
    }
}

/// Gets the [`Workload`] named `name`.
///
/// Returns an [`anyhow::Error`] if no application with the given name was found.
pub fn named(name: &str) -> Result<Workload> {
    match try_named(name) {
        Some(app) => Ok(app),
        None => bail!("No app named `{}` found.", name),
    }
}
