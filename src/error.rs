use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[derive(Debug, Display, Error)]
pub enum Error {
    // `#[error(not(source))]` below tells `derive_more` that `embassy_executor::SpawnError` does
    // not implement Rust's `core::error::Error` trait.
    /// An embassy task could not be spawned.
    #[cfg(not(feature = "host"))]
    #[display("{_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    /// All raster slots are in use.
    #[display("raster registry is full")]
    RasterRegistryFull,

    /// The cell arena cannot hold another raster of the requested size.
    #[display("raster arena is full: requested {requested} cells, {available} available")]
    RasterArenaFull {
        /// Cells the new raster needs.
        requested: usize,
        /// Cells still free in the arena.
        available: usize,
    },

    /// No raster exists with this id.
    #[display("unknown raster id {_0}")]
    UnknownRaster(#[error(not(source))] u8),

    /// A raster must have at least one row and one column.
    #[display("raster height and width must be non-zero")]
    EmptyRaster,

    /// A raster's start address lies outside the installation.
    #[display("start address is outside the configured boards, strips, or pixels")]
    StartOutOfRange,

    /// A cell coordinate lies outside its raster.
    #[display("cell index is outside the raster")]
    IndexOutOfBounds,

    /// The effect schedule has no room for another entry.
    #[display("schedule is full")]
    ScheduleFull,

    /// The producer's frame is still with the output executor.
    #[display("frame is still in flight")]
    FrameInFlight,
}

#[cfg(not(feature = "host"))]
impl From<embassy_executor::SpawnError> for Error {
    fn from(err: embassy_executor::SpawnError) -> Self {
        Self::TaskSpawn(err)
    }
}
