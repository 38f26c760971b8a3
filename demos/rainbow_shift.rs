#![allow(missing_docs)]
#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};

use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::multicore::Stack;
use embassy_rp::pio::Pio;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant, Ticker};
use pixel_blit::Result;
use pixel_blit::frame_buffer::{FrameBuffer, PixelAddress};
use pixel_blit::output::ws2812_parallel::{
    ParallelWs2812Program, Ws2812Parallel, Ws2812ParallelStatic, spawn_output_core,
};
use pixel_blit::output::{BoardSelect, FrameProducer, OutputConfig, OutputHandoff};
use pixel_blit::pio_irqs::Pio0Irqs;
use pixel_blit::raster::{RasterRegistry, WrapMode};
use pixel_blit::schedule::paint_rainbow;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt::info, defmt_rtt as _, panic_probe as _};

/// Two 16x100 panels.
const CELLS: usize = 2 * 16 * 100;
/// Milliseconds for one full pan.
const PAN_PERIOD_MS: u16 = 10_000;

static FRAMES: ConstStaticCell<[FrameBuffer; 2]> =
    ConstStaticCell::new([FrameBuffer::new(), FrameBuffer::new()]);
static REGISTRY: ConstStaticCell<RasterRegistry<CELLS>> =
    ConstStaticCell::new(RasterRegistry::new());
static HANDOFF: OutputHandoff<'static, CriticalSectionRawMutex> = OutputHandoff::new();
static OUTPUT_STATIC: Ws2812ParallelStatic = Ws2812Parallel::new_static();
static CORE1_STACK: StaticCell<Stack<8192>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Pio0Irqs);
    let program = ParallelWs2812Program::new(&mut common);
    let pins = [
        common.make_pio_pin(p.PIN_0),
        common.make_pio_pin(p.PIN_1),
        common.make_pio_pin(p.PIN_2),
        common.make_pio_pin(p.PIN_3),
        common.make_pio_pin(p.PIN_4),
        common.make_pio_pin(p.PIN_5),
        common.make_pio_pin(p.PIN_6),
        common.make_pio_pin(p.PIN_7),
        common.make_pio_pin(p.PIN_8),
        common.make_pio_pin(p.PIN_9),
        common.make_pio_pin(p.PIN_10),
        common.make_pio_pin(p.PIN_11),
        common.make_pio_pin(p.PIN_12),
        common.make_pio_pin(p.PIN_13),
        common.make_pio_pin(p.PIN_14),
        common.make_pio_pin(p.PIN_15),
    ];
    let board_select = BoardSelect::new([
        Output::new(p.PIN_16, Level::Low),
        Output::new(p.PIN_17, Level::Low),
        Output::new(p.PIN_18, Level::Low),
        Output::new(p.PIN_19, Level::Low),
    ]);
    let output = Ws2812Parallel::new(
        &OUTPUT_STATIC,
        sm0,
        &program,
        &pins,
        p.DMA_CH0,
        p.DMA_CH1,
        board_select,
        OutputConfig::default(),
    );

    let [frame, spare] = FRAMES.take();
    spawn_output_core(p.CORE1, CORE1_STACK.init(Stack::new()), &HANDOFF, spare, output);
    let mut producer = FrameProducer::new(&HANDOFF, frame);

    let registry = REGISTRY.take();
    let first = registry.create_raster(16, 100, PixelAddress::new(0, 0, 0), WrapMode::Clip)?;
    let last = registry.create_raster(16, 100, PixelAddress::new(9, 0, 0), WrapMode::Clip)?;
    paint_rainbow(&mut registry.raster_mut(first)?);
    paint_rainbow(&mut registry.raster_mut(last)?);
    info!("rainbow_shift: {} rasters ready", registry.len());

    let started = Instant::now();
    let mut ticker = Ticker::every(Duration::from_millis(20));
    loop {
        let millis = started.elapsed().as_millis() % u64::from(PAN_PERIOD_MS);
        let shift = f32::from(u16::try_from(millis).unwrap_or(0)) / f32::from(PAN_PERIOD_MS);
        let frame = producer.frame_mut()?;
        registry.show_raster_object_with_shift(first, shift, 0.0, frame)?;
        registry.show_raster_object_with_shift(last, 0.0, -shift, frame)?;
        producer.request_output().await?;
        ticker.next().await;
    }
}
