//! Driver seam, status codes and types shared by kiln crates.

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

pub use crate::{
    backend::*, casts::*, error::*, info::*, range::*, rect::*, region::*, slow::*, status::*,
    wrap::*,
};

pub use {bitflags, smallvec};

pub mod backend;
mod casts;
mod error;
mod info;
mod range;
mod rect;
mod region;
mod slow;
mod status;
mod wrap;
