//! Text content of each screen.
//!
//! The device has no graphics stack of its own; a [`Frame`] is the list of
//! text rows the current screen shows, top to bottom. The binary prints a
//! frame whenever it differs from the previous one.

use super::{HomeItem, Screen};
use crate::acquisition::Ambient;
use crate::analysis::QualityResult;
use crate::config::PROGRESS_FULL_PERMILLE;
use core::fmt;

/// Maximum rows on one screen.
pub const FRAME_ROWS: usize = 8;

/// Cells in the loading bar.
const BAR_CELLS: usize = 20;

const INSTRUCTIONS: &str = "Please put and hold the device as close to the meat as possible";

/// Rendered screen content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    lines: heapless::Vec<String, FRAME_ROWS>,
}

impl Frame {
    fn push(&mut self, line: impl Into<String>) {
        // Rows past FRAME_ROWS do not fit the panel; drop them.
        let _ = self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True if any row contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Render `screen` into text rows.
pub fn render(screen: &Screen) -> Frame {
    let mut frame = Frame::default();
    match screen {
        Screen::Boot => frame.push("AmiNIC"),
        Screen::Home { focus } => draw_home(&mut frame, *focus),
        Screen::Blank => frame.push("Turning off..."),
        Screen::Loading {
            progress_permille,
            capturing,
        } => draw_loading(&mut frame, *progress_permille, *capturing),
        Screen::Examination => {
            frame.push("EXAMINATION");
            frame.push(INSTRUCTIONS);
            frame.push(focused("START", true));
        }
        Screen::Countdown {
            remaining,
            capturing,
        } => {
            frame.push("Hold it for:");
            frame.push(format!("{remaining} s"));
            if *capturing {
                frame.push("Measuring...");
            }
        }
        Screen::MeasurementResult {
            result,
            back_focused,
        } => {
            draw_measurement(&mut frame, result);
            frame.push(focused("BACK", *back_focused));
        }
        Screen::MeasurementFailed {
            reason,
            back_focused,
        } => {
            frame.push("MEASUREMENT FAILED");
            frame.push(reason.to_string());
            frame.push(focused("BACK", *back_focused));
        }
        Screen::TemperatureLoading => frame.push("Getting temperature..."),
        Screen::TemperatureResult {
            ambient,
            back_focused,
        } => {
            draw_temperature(&mut frame, ambient);
            frame.push(focused("BACK", *back_focused));
        }
    }
    frame
}

fn focused(label: &str, focus: bool) -> String {
    let marker = if focus { ">" } else { " " };
    format!("{marker} {label}")
}

fn draw_home(frame: &mut Frame, focus: HomeItem) {
    frame.push("AmiNIC");
    for item in HomeItem::ALL {
        frame.push(focused(item.label(), item == focus));
    }
}

fn draw_loading(frame: &mut Frame, permille: u16, capturing: bool) {
    let permille = permille.min(PROGRESS_FULL_PERMILLE);
    let filled = usize::from(permille) * BAR_CELLS / usize::from(PROGRESS_FULL_PERMILLE);
    frame.push("Loading...");
    frame.push(format!(
        "[{}{}] {:.1}%",
        "#".repeat(filled),
        "-".repeat(BAR_CELLS - filled),
        f64::from(permille) / 10.0
    ));
    if capturing {
        frame.push("Measuring...");
    }
}

fn humidity_text(humidity: Option<f64>, precision: usize) -> String {
    match humidity {
        Some(h) => format!("{h:.precision$}"),
        None => "--".into(),
    }
}

fn draw_measurement(frame: &mut Frame, result: &QualityResult) {
    let [a, b, c] = result.phase;
    frame.push(format!("Temperature: {}°C", result.ambient.temperature));
    frame.push(format!("Humidity: {}%", humidity_text(result.ambient.humidity, 1)));
    frame.push(format!("Quality: ({a}, {b}, {c})"));
}

fn draw_temperature(frame: &mut Frame, ambient: &Ambient) {
    frame.push("TEMPERATURE");
    frame.push(format!("Temperature: {:.2}°C", ambient.temperature));
    frame.push(format!("Humidity: {}%", humidity_text(ambient.humidity, 2)));
}
