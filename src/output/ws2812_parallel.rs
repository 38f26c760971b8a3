//! Parallel WS2812 output: one PIO state machine, two chained DMA channels, and
//! four board-select lines.
//!
//! Each 32-bit bit-plane word becomes one WS2812 bit on every strip at once. The PIO
//! program raises all strip pins, drives them to the word's bits, then lowers them, in
//! ten PIO cycles per bit.
//!
//! The data channel moves one [`BitPlaneValue`] (eight words) into the PIO TX FIFO,
//! then chains to the control channel, which loads the next fragment address from a
//! null-terminated table into the data channel's read-address trigger. The null entry
//! stops the chain and raises the data channel's interrupt flag. The latch task sees
//! that flag, waits out the settle delay, and releases the [`LatchGate`].
//!
//! Wiring is fixed to `PIO0` state machine 0 with [`STRIPS`] consecutive out pins.
//!
//! # Example
//!
//! ```no_run
//! # #![no_std]
//! # #![no_main]
//! # use panic_probe as _;
//! use embassy_executor::Spawner;
//! use embassy_rp::gpio::{Level, Output};
//! use embassy_rp::multicore::Stack;
//! use embassy_rp::pio::Pio;
//! use pixel_blit::frame_buffer::FrameBuffer;
//! use pixel_blit::output::ws2812_parallel::{
//!     ParallelWs2812Program, Ws2812Parallel, Ws2812ParallelStatic, spawn_output_core,
//! };
//! use pixel_blit::output::{BoardSelect, FrameProducer, OutputConfig, OutputHandoff};
//! use pixel_blit::pio_irqs::Pio0Irqs;
//! use static_cell::{ConstStaticCell, StaticCell};
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//!
//! static FRAMES: ConstStaticCell<[FrameBuffer; 2]> =
//!     ConstStaticCell::new([FrameBuffer::new(), FrameBuffer::new()]);
//! static HANDOFF: OutputHandoff<'static, CriticalSectionRawMutex> = OutputHandoff::new();
//! static OUTPUT_STATIC: Ws2812ParallelStatic = Ws2812Parallel::new_static();
//! static CORE1_STACK: StaticCell<Stack<8192>> = StaticCell::new();
//!
//! #[embassy_executor::main]
//! async fn main(_spawner: Spawner) {
//!     let p = embassy_rp::init(Default::default());
//!     let Pio { mut common, sm0, .. } = Pio::new(p.PIO0, Pio0Irqs);
//!     let program = ParallelWs2812Program::new(&mut common);
//!     let pins = [
//!         common.make_pio_pin(p.PIN_0), common.make_pio_pin(p.PIN_1),
//!         common.make_pio_pin(p.PIN_2), common.make_pio_pin(p.PIN_3),
//!         common.make_pio_pin(p.PIN_4), common.make_pio_pin(p.PIN_5),
//!         common.make_pio_pin(p.PIN_6), common.make_pio_pin(p.PIN_7),
//!         common.make_pio_pin(p.PIN_8), common.make_pio_pin(p.PIN_9),
//!         common.make_pio_pin(p.PIN_10), common.make_pio_pin(p.PIN_11),
//!         common.make_pio_pin(p.PIN_12), common.make_pio_pin(p.PIN_13),
//!         common.make_pio_pin(p.PIN_14), common.make_pio_pin(p.PIN_15),
//!     ];
//!     let board_select = BoardSelect::new([
//!         Output::new(p.PIN_16, Level::Low),
//!         Output::new(p.PIN_17, Level::Low),
//!         Output::new(p.PIN_18, Level::Low),
//!         Output::new(p.PIN_19, Level::Low),
//!     ]);
//!     let output = Ws2812Parallel::new(
//!         &OUTPUT_STATIC, sm0, &program, &pins,
//!         p.DMA_CH0, p.DMA_CH1, board_select, OutputConfig::default(),
//!     );
//!
//!     let [frame, spare] = FRAMES.take();
//!     spawn_output_core(p.CORE1, CORE1_STACK.init(Stack::new()), &HANDOFF, spare, output);
//!
//!     let mut producer = FrameProducer::new(&HANDOFF, frame);
//!     producer.request_output().await.ok();
//! }
//! ```

use core::sync::atomic::{Ordering, compiler_fence};

use embassy_executor::Executor;
use embassy_rp::Peri;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::dma::{AnyChannel, Channel};
use embassy_rp::gpio::Output;
use embassy_rp::multicore::{Stack, spawn_core1};
use embassy_rp::pac;
use embassy_rp::pac::dma::regs::CtrlTrig;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::peripherals::{CORE1, PIO0};
use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, LoadedProgram, Pin, ShiftConfig, ShiftDirection,
    StateMachine,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use fixed::types::U24F8;
use static_cell::StaticCell;

use super::{BoardSelect, FrameOutput, LatchGate, OutputConfig, OutputHandoff, run_output_executor};
use crate::bit_plane::{BitPlaneValue, PLANE_COUNT};
use crate::frame_buffer::FrameBuffer;
use crate::{SLOTS_PER_BOARD, STRIPS};

/// PIO cycles per WS2812 bit.
const CYCLES_PER_BIT: u32 = 10;

/// DREQ number of PIO0's state machine 0 TX FIFO.
const PIO0_TX0_DREQ: u8 = 0;

/// The bit-plane waveform program, loaded once into `PIO0`.
pub struct ParallelWs2812Program<'d> {
    program: LoadedProgram<'d, PIO0>,
}

impl<'d> ParallelWs2812Program<'d> {
    /// Load the program into `common`.
    pub fn new(common: &mut Common<'d, PIO0>) -> Self {
        let program = pio::pio_asm!(
            ".wrap_target",
            "out x, 32",
            "mov pins, !null [2]",
            "mov pins, x [2]",
            "mov pins, null [2]",
            ".wrap",
        );
        Self {
            program: common.load_program(&program.program),
        }
    }
}

/// A transfer the latch task should watch.
#[derive(Clone, Copy)]
struct LatchJob {
    data_channel: u8,
    reset_delay: Duration,
}

/// Static resources shared by [`Ws2812Parallel`] and its latch task.
pub struct Ws2812ParallelStatic {
    gate: LatchGate<CriticalSectionRawMutex>,
    started: Signal<CriticalSectionRawMutex, LatchJob>,
}

impl Ws2812ParallelStatic {
    const fn new() -> Self {
        Self {
            gate: LatchGate::new(),
            started: Signal::new(),
        }
    }
}

/// PIO + DMA implementation of [`FrameOutput`].
///
/// Must not move while a transfer is running: the DMA control channel reads the
/// fragment table in place. Owning it inside a task (see [`spawn_output_core`]) keeps
/// it pinned.
pub struct Ws2812Parallel<'d> {
    state: &'static Ws2812ParallelStatic,
    _sm: StateMachine<'d, PIO0, 0>,
    data: Peri<'d, AnyChannel>,
    control: Peri<'d, AnyChannel>,
    board_select: BoardSelect<Output<'d>>,
    reset_delay: Duration,
    fragments: [u32; SLOTS_PER_BOARD + 1],
}

impl<'d> Ws2812Parallel<'d> {
    /// Static resources for one output.
    #[must_use]
    pub const fn new_static() -> Ws2812ParallelStatic {
        Ws2812ParallelStatic::new()
    }

    /// Configure the state machine and both DMA channels.
    ///
    /// `pins` must be [`STRIPS`] consecutive GPIOs, strip 0 first. No transfer starts
    /// until [`FrameOutput::start_transfer`].
    #[expect(clippy::too_many_arguments, reason = "each argument is a distinct peripheral")]
    pub fn new(
        state: &'static Ws2812ParallelStatic,
        mut sm: StateMachine<'d, PIO0, 0>,
        program: &ParallelWs2812Program<'d>,
        pins: &[Pin<'d, PIO0>; STRIPS],
        data: Peri<'d, impl Channel>,
        control: Peri<'d, impl Channel>,
        board_select: BoardSelect<Output<'d>>,
        config: OutputConfig,
    ) -> Self {
        let pins: [&Pin<'d, PIO0>; STRIPS] = core::array::from_fn(|strip| &pins[strip]);
        sm.set_pin_dirs(Direction::Out, &pins);

        let mut cfg = Config::default();
        cfg.use_program(&program.program, &[]);
        cfg.set_out_pins(&pins);
        let clock_freq = U24F8::from_num(clk_sys_freq() / 1000);
        let bit_freq = U24F8::from_num(config.bit_rate_hz / 1000) * CYCLES_PER_BIT;
        cfg.clock_divider = clock_freq / bit_freq;
        cfg.fifo_join = FifoJoin::TxOnly;
        cfg.shift_out = ShiftConfig {
            auto_fill: true,
            threshold: 32,
            direction: ShiftDirection::Right,
        };
        sm.set_config(&cfg);
        sm.set_enable(true);

        let data: Peri<'d, AnyChannel> = data.into();
        let control: Peri<'d, AnyChannel> = control.into();
        configure_dma(&data, &control);
        debug!(
            "ws2812_parallel: data dma {}, control dma {}",
            data.number(),
            control.number()
        );

        Self {
            state,
            _sm: sm,
            data,
            control,
            board_select,
            reset_delay: Duration::from_micros(config.reset_delay_us),
            fragments: [0; SLOTS_PER_BOARD + 1],
        }
    }

    fn data_mask(&self) -> u32 {
        1 << self.data.number()
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "peripheral addresses are 32-bit on RP2040/RP235x"
)]
fn configure_dma(data: &Peri<'_, AnyChannel>, control: &Peri<'_, AnyChannel>) {
    let data_regs = data.regs();
    let control_regs = control.regs();

    // Completion is polled from INTR; keep the HAL's DMA handler from clearing it.
    let data_mask = 1_u32 << data.number();
    pac::DMA.inte(0).modify(|enabled| *enabled &= !data_mask);

    data_regs
        .write_addr()
        .write_value(pac::PIO0.txf(0).as_ptr() as u32);
    set_trans_count(data_regs, PLANE_COUNT as u32);
    let mut data_ctrl = CtrlTrig(0);
    data_ctrl.set_incr_read(true);
    data_ctrl.set_incr_write(false);
    data_ctrl.set_data_size(DataSize::SIZE_WORD);
    data_ctrl.set_treq_sel(TreqSel(PIO0_TX0_DREQ));
    data_ctrl.set_irq_quiet(true);
    data_ctrl.set_chain_to(control.number());
    data_ctrl.set_en(true);
    data_regs.al1_ctrl().write_value(data_ctrl.0);

    control_regs
        .write_addr()
        .write_value(data_regs.al3_read_addr_trig().as_ptr() as u32);
    set_trans_count(control_regs, 1);
    let mut control_ctrl = CtrlTrig(0);
    control_ctrl.set_incr_read(true);
    control_ctrl.set_incr_write(false);
    control_ctrl.set_data_size(DataSize::SIZE_WORD);
    control_ctrl.set_treq_sel(TreqSel::PERMANENT);
    control_ctrl.set_irq_quiet(true);
    // Chaining to itself disables chaining.
    control_ctrl.set_chain_to(control.number());
    control_ctrl.set_en(true);
    control_regs.al1_ctrl().write_value(control_ctrl.0);
}

#[cfg(feature = "pico1")]
fn set_trans_count(regs: pac::dma::Channel, count: u32) {
    regs.trans_count().write_value(count);
}

#[cfg(feature = "pico2")]
fn set_trans_count(regs: pac::dma::Channel, count: u32) {
    regs.trans_count().write(|w| {
        w.set_mode(0.into());
        w.set_count(count);
    });
}

impl FrameOutput for Ws2812Parallel<'_> {
    async fn wait_ready(&mut self) {
        self.state.gate.acquire().await;
    }

    async fn wait_idle(&mut self) {
        self.state.gate.wait_released().await;
    }

    fn select_board(&mut self, board: u8) {
        self.board_select.select(board);
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "RAM addresses are 32-bit on RP2040/RP235x"
    )]
    fn start_transfer(&mut self, fragments: &[BitPlaneValue]) {
        let (table, terminator) = self.fragments.split_at_mut(SLOTS_PER_BOARD);
        for (entry, fragment) in table.iter_mut().zip(fragments) {
            *entry = fragment.as_ptr() as u32;
        }
        table[fragments.len().min(SLOTS_PER_BOARD)..].fill(0);
        terminator.fill(0);

        pac::DMA.intr().write_value(self.data_mask());
        self.state.started.signal(LatchJob {
            data_channel: self.data.number(),
            reset_delay: self.reset_delay,
        });
        compiler_fence(Ordering::SeqCst);
        self.control
            .regs()
            .al3_read_addr_trig()
            .write_value(self.fragments.as_ptr() as u32);
    }
}

/// Watch each started transfer for completion, wait out the settle delay, then release
/// the gate.
#[embassy_executor::task]
async fn latch_task(state: &'static Ws2812ParallelStatic) -> ! {
    loop {
        let job = state.started.wait().await;
        let mask = 1_u32 << job.data_channel;
        while pac::DMA.intr().read() & mask == 0 {
            embassy_futures::yield_now().await;
        }
        pac::DMA.intr().write_value(mask);
        Timer::after(job.reset_delay).await;
        state.gate.release();
        trace!("latch: released");
    }
}

#[embassy_executor::task]
async fn output_executor_task(
    handoff: &'static OutputHandoff<'static, CriticalSectionRawMutex>,
    spare: &'static mut FrameBuffer,
    mut output: Ws2812Parallel<'static>,
) -> ! {
    run_output_executor(handoff, spare, &mut output).await
}

/// Start an executor on core 1 running the output executor and its latch task.
///
/// The producer keeps the other frame and talks to the executor through `handoff`.
pub fn spawn_output_core<const STACK: usize>(
    core1: Peri<'static, CORE1>,
    stack: &'static mut Stack<STACK>,
    handoff: &'static OutputHandoff<'static, CriticalSectionRawMutex>,
    spare: &'static mut FrameBuffer,
    output: Ws2812Parallel<'static>,
) {
    static EXECUTOR1: StaticCell<Executor> = StaticCell::new();
    let state = output.state;
    spawn_core1(core1, stack, move || {
        let executor = EXECUTOR1.init(Executor::new());
        executor.run(|spawner| {
            defmt::unwrap!(spawner.spawn(latch_task(state)));
            defmt::unwrap!(spawner.spawn(output_executor_task(handoff, spare, output)));
        })
    });
    info!("output core: started");
}
