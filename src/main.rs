//! aminic - handheld sweep analyser, device entry point.
//!
//! Task architecture: one cooperative loop on the embassy std executor.
//! Every `BUTTON_POLL_MS` it
//!
//!   1. samples and debounces the four GPIO buttons,
//!   2. hands accepted presses to the screen state machine,
//!   3. runs the timers and serial polls that are due,
//!   4. prints the current screen if it changed.
//!
//! SIGINT/SIGTERM end the loop; the GPIO lines and the serial port are
//! released on the way out.

use aminic::acquisition::port::SerialLink;
use aminic::acquisition::AcquisitionChannel;
use aminic::analysis::Analyzer;
use aminic::config::{
    Timing, BUTTON_POLL_MS, COUNTDOWN_START, DATA_DIR, GPIO_CHIP, SERIAL_BAUD, SERIAL_PORT,
    SERIAL_TIMEOUT_MS, SMOOTHING_ORDER, SMOOTHING_WINDOW,
};
use aminic::device::open_buttons;
use aminic::storage::CsvStore;
use aminic::ui::display::{render, Frame};
use aminic::ui::machine::Controller;
use anyhow::{Context, Result};
use clap::Parser;
use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Ticker};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aminic", version, about = "Handheld sweep analyser")]
struct Args {
    /// Serial device of the sensor MCU.
    #[arg(long, default_value = SERIAL_PORT)]
    port: String,

    #[arg(long, default_value_t = SERIAL_BAUD)]
    baud: u32,

    /// GPIO character device carrying the button lines.
    #[arg(long, default_value = GPIO_CHIP)]
    gpio_chip: String,

    /// Directory for the raw capture CSV files.
    #[arg(long, default_value = DATA_DIR)]
    data_dir: PathBuf,

    /// Hold countdown length in seconds.
    #[arg(
        long,
        default_value_t = COUNTDOWN_START,
        value_parser = clap::value_parser!(u8).range(1..)
    )]
    countdown: u8,
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    info!("aminic starting...");

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    // ═══════════════════════════════════════════════════════════════════
    // Shutdown flag
    // ═══════════════════════════════════════════════════════════════════

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&stop))
            .with_context(|| format!("installing handler for signal {signal}"))?;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Hardware
    // ═══════════════════════════════════════════════════════════════════

    let mut buttons = open_buttons(&args.gpio_chip)?;

    let link = SerialLink::open(&args.port, args.baud, SERIAL_TIMEOUT_MS)
        .with_context(|| format!("opening serial port {}", args.port))?;
    info!(
        "Serial: {} at {} baud",
        link.name().unwrap_or_else(|| args.port.clone()),
        args.baud
    );

    // ═══════════════════════════════════════════════════════════════════
    // State machine
    // ═══════════════════════════════════════════════════════════════════

    let analyzer = Analyzer::new(SMOOTHING_WINDOW, SMOOTHING_ORDER)
        .context("building smoothing filter")?;
    let timing = Timing {
        countdown_start: args.countdown,
        ..Timing::default()
    };
    let store = CsvStore::new(&args.data_dir);
    info!("Storage: {}", store.dir().display());

    let epoch = Instant::now();
    let now_ms = || Instant::now().duration_since(epoch).as_millis();

    let mut controller = Controller::new(
        AcquisitionChannel::new(link),
        store,
        analyzer,
        timing,
        now_ms(),
    );

    // ═══════════════════════════════════════════════════════════════════
    // Main loop
    // ═══════════════════════════════════════════════════════════════════

    let mut ticker = Ticker::every(Duration::from_millis(BUTTON_POLL_MS));
    let mut shown: Option<Frame> = None;

    while !stop.load(Ordering::Relaxed) {
        let now = now_ms();
        for event in buttons.poll(now) {
            controller.handle_button(event);
        }
        controller.tick(now);

        let frame = render(controller.screen());
        if shown.as_ref() != Some(&frame) {
            println!("{frame}");
            shown = Some(frame);
        }

        ticker.next().await;
    }

    info!("Shutdown requested");
    let (channel, _store) = controller.into_parts();
    drop(channel.into_transport());
    info!("Serial: port closed");
    drop(buttons.into_pins());
    info!("GPIO: lines released");
    Ok(())
}
