//! `defmt` logging that compiles away on host builds.
//!
//! Host test binaries have no global `defmt` logger to link against, so these wrappers
//! only evaluate (and discard) their arguments there.

#[cfg(not(feature = "host"))]
macro_rules! log_at {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        defmt::$level!($fmt $(, $arg)*)
    };
}

#[cfg(feature = "host")]
macro_rules! log_at {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        $(let _ = &$arg;)*
    }};
}

macro_rules! info {
    ($($tt:tt)*) => { log_at!(info, $($tt)*) };
}

macro_rules! warn {
    ($($tt:tt)*) => { log_at!(warn, $($tt)*) };
}

macro_rules! debug {
    ($($tt:tt)*) => { log_at!(debug, $($tt)*) };
}

macro_rules! trace {
    ($($tt:tt)*) => { log_at!(trace, $($tt)*) };
}
