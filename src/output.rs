//! Frame output: board-by-board transmission and the producer/executor handoff.
//!
//! [`FrameOutput`] is the seam between frame logic and hardware. [`transmit_frame`] walks
//! the boards of a [`FrameBuffer`] through it. The hardware implementation is
//! [`ws2812_parallel::Ws2812Parallel`] (PIO + chained DMA); tests use a recording stand-in.
//!
//! Frames move between the drawing side and the output side by ownership:
//!
//! 1. The [`FrameProducer`] owns one frame and draws into it.
//! 2. [`FrameProducer::request_output`] sends that frame to [`run_output_executor`].
//! 3. The executor copies it into its spare frame and hands the spare back, so the
//!    producer continues from an identical picture (unmodified pixels persist).
//! 4. The executor streams the submitted frame, which becomes its next spare.
//!
//! Neither side ever touches a frame the other owns, so no locking is needed beyond the
//! two depth-one channels.

#[cfg(not(feature = "host"))]
pub mod ws2812_parallel;

use core::convert::Infallible;
use core::future::poll_fn;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use embedded_hal::digital::{OutputPin, PinState};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::bit_plane::BitPlaneValue;
use crate::frame_buffer::FrameBuffer;
use crate::raster::RasterRegistry;
use crate::{BOARD_SELECT_LINES, BOARDS, Error, RESET_DELAY_US, Result, WS2812_BIT_RATE_HZ};

/// Timing for WS2812 output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    /// Bit rate on every strip.
    pub bit_rate_hz: u32,
    /// Settle delay after a board's transfer completes.
    pub reset_delay_us: u64,
}

impl OutputConfig {
    /// Standard WS2812 timing with the installation's settle delay.
    pub const DEFAULT: Self = Self {
        bit_rate_hz: WS2812_BIT_RATE_HZ,
        reset_delay_us: RESET_DELAY_US,
    };
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Hardware seam for streaming one board at a time.
pub trait FrameOutput {
    /// Wait until the previous transfer has completed and settled, and claim the
    /// output for the next one.
    async fn wait_ready(&mut self);

    /// Wait until no transfer is in progress or settling, without claiming the output.
    async fn wait_idle(&mut self);

    /// Drive the board-select lines for `board`.
    fn select_board(&mut self, board: u8);

    /// Start streaming `fragments` (one board's slots) to the selected board.
    ///
    /// The engine may keep reading `fragments` after this returns. Callers must not
    /// modify them until [`wait_ready`](Self::wait_ready) or
    /// [`wait_idle`](Self::wait_idle) has returned.
    fn start_transfer(&mut self, fragments: &[BitPlaneValue]);
}

/// Stream every board of `frame`, in board order.
///
/// Each board waits for the previous board's transfer and settle delay, selects the
/// board, then starts its transfer. Returns once the last board's transfer has started.
pub async fn transmit_frame<O: FrameOutput>(frame: &FrameBuffer, output: &mut O) {
    for board in 0..BOARDS {
        output.wait_ready().await;
        #[expect(clippy::cast_possible_truncation, reason = "BOARDS fits the select lines")]
        output.select_board(board as u8);
        output.start_transfer(frame.board(board));
        trace!("transmit_frame: board {} started", board);
    }
}

/// Binary board-select lines: bit `i` of the board index drives line `i`.
pub struct BoardSelect<P: OutputPin<Error = Infallible>> {
    lines: [P; BOARD_SELECT_LINES],
}

impl<P: OutputPin<Error = Infallible>> BoardSelect<P> {
    /// Take ownership of the select lines, least significant first, and select board 0.
    pub fn new(lines: [P; BOARD_SELECT_LINES]) -> Self {
        let mut board_select = Self { lines };
        board_select.select(0);
        board_select
    }

    /// Drive the lines for `board`. Bits above the line count are ignored.
    pub fn select(&mut self, board: u8) {
        for (bit, line) in self.lines.iter_mut().enumerate() {
            let state = PinState::from((board >> bit) & 1 == 1);
            let Ok(()) = line.set_state(state);
        }
    }

    /// Give the lines back.
    pub fn into_lines(self) -> [P; BOARD_SELECT_LINES] {
        self.lines
    }
}

/// Saturating one-slot gate: released when the output may start another transfer.
///
/// Starts released. [`acquire`](Self::acquire) waits for it and closes it;
/// [`release`](Self::release) opens it (releasing twice is the same as once).
pub struct LatchGate<M: RawMutex> {
    busy: AtomicBool,
    released: Signal<M, ()>,
}

impl<M: RawMutex> LatchGate<M> {
    /// A released gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            released: Signal::new(),
        }
    }

    /// Wait for the gate to be released, then close it.
    pub async fn acquire(&self) {
        while self.busy.swap(true, Ordering::AcqRel) {
            self.released.wait().await;
        }
    }

    /// Close the gate without waiting. Returns `false` if it was already closed.
    pub fn try_acquire(&self) -> bool {
        !self.busy.swap(true, Ordering::AcqRel)
    }

    /// Open the gate.
    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
        self.released.signal(());
    }

    /// Wait for the gate to be released, leaving it open.
    pub async fn wait_released(&self) {
        while self.is_busy() {
            self.released.wait().await;
        }
    }

    /// Whether a transfer holds the gate.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl<M: RawMutex> Default for LatchGate<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Request from the producer to the output executor.
pub enum OutputCommand<'a> {
    /// Stream this frame; the executor returns a copy of it as the producer's next frame.
    Show(&'a mut FrameBuffer),
    /// Turn every LED off. The producer keeps its frame.
    Blank,
}

/// Depth-one command queue plus the return path for spare frames.
///
/// Use `CriticalSectionRawMutex` when producer and executor run on different cores.
pub struct OutputHandoff<'a, M: RawMutex> {
    commands: Channel<M, OutputCommand<'a>, 1>,
    returns: Channel<M, &'a mut FrameBuffer, 1>,
    frames_shown: AtomicU32,
}

impl<'a, M: RawMutex> OutputHandoff<'a, M> {
    /// An empty handoff.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            returns: Channel::new(),
            frames_shown: AtomicU32::new(0),
        }
    }

    /// Frames the executor has started streaming (blank frames included).
    pub fn frames_shown(&self) -> u32 {
        self.frames_shown.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex> Default for OutputHandoff<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drawing side of an [`OutputHandoff`]: owns the frame being edited.
pub struct FrameProducer<'h, 'a, M: RawMutex> {
    handoff: &'h OutputHandoff<'a, M>,
    frame: Option<&'a mut FrameBuffer>,
}

impl<'h, 'a, M: RawMutex> FrameProducer<'h, 'a, M> {
    /// Start drawing into `frame`. The executor gets the other frame.
    pub const fn new(handoff: &'h OutputHandoff<'a, M>, frame: &'a mut FrameBuffer) -> Self {
        Self {
            handoff,
            frame: Some(frame),
        }
    }

    /// The frame being edited.
    ///
    /// # Errors
    ///
    /// [`Error::FrameInFlight`] if an earlier [`request_output`](Self::request_output)
    /// was dropped before the executor returned a frame, and none has arrived since.
    pub fn frame_mut(&mut self) -> Result<&mut FrameBuffer> {
        if self.frame.is_none() {
            self.frame = self.handoff.returns.try_receive().ok();
        }
        self.frame.as_deref_mut().ok_or(Error::FrameInFlight)
    }

    /// Send the current frame for output and continue with the copy the executor returns.
    ///
    /// The frame stays with the producer until the executor's queue accepts it, so a
    /// request dropped while the queue is full leaves the frame in place.
    ///
    /// # Errors
    ///
    /// [`Error::FrameInFlight`] if no frame is held (see [`frame_mut`](Self::frame_mut)).
    pub async fn request_output(&mut self) -> Result<()> {
        self.frame_mut()?;
        loop {
            poll_fn(|cx| self.handoff.commands.poll_ready_to_send(cx)).await;
            let frame = self.frame.take().ok_or(Error::FrameInFlight)?;
            match self.handoff.commands.try_send(OutputCommand::Show(frame)) {
                Ok(()) => break,
                Err(TrySendError::Full(command)) => {
                    if let OutputCommand::Show(frame) = command {
                        self.frame = Some(frame);
                    }
                }
            }
        }
        self.frame = Some(self.handoff.returns.receive().await);
        Ok(())
    }

    /// Ask the executor to turn every LED off. The current frame is kept.
    pub async fn request_blank(&mut self) {
        self.handoff.commands.send(OutputCommand::Blank).await;
    }

    /// Encode every raster in `registry` into the current frame, then request output.
    ///
    /// # Errors
    ///
    /// [`Error::FrameInFlight`] if no frame is held (see [`frame_mut`](Self::frame_mut)).
    pub async fn show_all<const CELLS: usize>(
        &mut self,
        registry: &RasterRegistry<CELLS>,
    ) -> Result<()> {
        registry.show_all_raster_objects(self.frame_mut()?);
        self.request_output().await
    }
}

/// Output side of an [`OutputHandoff`]. Runs forever.
///
/// `spare` is the frame the producer does not hold. Each `Show` is copied forward into
/// the spare (after any transfer still reading the spare has finished), the spare goes
/// back to the producer, and the submitted frame is streamed and kept as the next spare.
pub async fn run_output_executor<'a, M: RawMutex, O: FrameOutput>(
    handoff: &OutputHandoff<'a, M>,
    spare: &'a mut FrameBuffer,
    output: &mut O,
) -> ! {
    info!("output executor: started");
    let mut spare = spare;
    loop {
        match handoff.commands.receive().await {
            OutputCommand::Show(frame) => {
                output.wait_idle().await;
                spare.copy_from(frame);
                handoff.returns.send(spare).await;
                transmit_frame(frame, output).await;
                spare = frame;
            }
            OutputCommand::Blank => {
                output.wait_idle().await;
                spare.clear();
                transmit_frame(spare, output).await;
                debug!("output executor: blanked");
            }
        }
        handoff.frames_shown.fetch_add(1, Ordering::Relaxed);
    }
}
