//! Logging shims.
//!
//! Under `cfg(test)` the macros print to stdout, so diagnostics appear in
//! the output of failing tests.

#[cfg(test)]
#[allow(unused_imports)]
pub(crate) use std::{println as debug, println as error, println as info, println as warn};

#[cfg(not(test))]
#[allow(unused_imports)]
pub(crate) use log::{debug, error, info, warn};

/// A diagnostic that reports itself through the log.
pub trait Log {
    fn log(&self);
}
