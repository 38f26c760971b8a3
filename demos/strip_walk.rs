#![allow(missing_docs)]
#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

//! Wiring check: one LED per strip walks from pixel 0 to the end. Each strip gets its
//! own hue, so a swapped data line or select line shows up as a wrong color or board.

use core::{convert::Infallible, panic};

use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::multicore::Stack;
use embassy_rp::pio::Pio;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};
use pixel_blit::color::{BLACK, Hsl, fade_rgb, hsl_to_rgb};
use pixel_blit::frame_buffer::{FrameBuffer, PixelAddress};
use pixel_blit::output::ws2812_parallel::{
    ParallelWs2812Program, Ws2812Parallel, Ws2812ParallelStatic, spawn_output_core,
};
use pixel_blit::output::{BoardSelect, FrameProducer, OutputConfig, OutputHandoff};
use pixel_blit::pio_irqs::Pio0Irqs;
use pixel_blit::{BOARDS, NUM_PIXELS, Result, STRIPS};
use static_cell::{ConstStaticCell, StaticCell};
use {defmt::info, defmt_rtt as _, panic_probe as _};

static FRAMES: ConstStaticCell<[FrameBuffer; 2]> =
    ConstStaticCell::new([FrameBuffer::new(), FrameBuffer::new()]);
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

    let strip_colors: [_; STRIPS] = core::array::from_fn(|strip| {
        let hue = f32::from(u8::try_from(strip).unwrap_or(0)) / 16.0;
        fade_rgb(hsl_to_rgb(Hsl::new(hue, 1.0, 0.5)), 64)
    });

    loop {
        for pixel in 0..u8::try_from(NUM_PIXELS).unwrap_or(u8::MAX) {
            let frame = producer.frame_mut()?;
            for board in 0..u8::try_from(BOARDS).unwrap_or(u8::MAX) {
                for (strip, &color) in (0_u8..).zip(&strip_colors) {
                    if let Some(previous) = pixel.checked_sub(1) {
                        frame.encode_pixel(PixelAddress::new(board, strip, previous), BLACK);
                    }
                    frame.encode_pixel(PixelAddress::new(board, strip, pixel), color);
                }
            }
            producer.request_output().await?;
            Timer::after(Duration::from_millis(30)).await;
        }

        producer.frame_mut()?.clear();
        producer.request_blank().await;
        info!("strip_walk: lap done, {} frames shown", HANDOFF.frames_shown());
        Timer::after(Duration::from_millis(500)).await;
    }
}
