//! GPIO button lines on the Linux character device.
//!
//! The buttons are active-low; pull-ups are fitted on the board, the line
//! requests only ask for plain inputs.

use crate::ui::buttons::ButtonPad;
use crate::ui::ButtonId;
use anyhow::{Context, Result};
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use tracing::info;

const CONSUMER: &str = "aminic";

/// Request the four button lines on `chip_path`.
pub fn open_buttons(chip_path: &str) -> Result<ButtonPad<CdevPin>> {
    let mut chip =
        Chip::new(chip_path).with_context(|| format!("opening GPIO chip {chip_path}"))?;

    let mut pins = Vec::with_capacity(ButtonId::ALL.len());
    for button in ButtonId::ALL {
        let offset = button.gpio_line();
        let handle = chip
            .get_line(offset)
            .with_context(|| format!("getting {} line {offset}", button.name()))?
            .request(LineRequestFlags::INPUT, 0, CONSUMER)
            .with_context(|| format!("requesting {} line {offset}", button.name()))?;
        let pin = CdevPin::new(handle)
            .with_context(|| format!("creating {} pin", button.name()))?;
        pins.push(pin);
        info!("GPIO: {} on line {}", button.name(), offset);
    }

    let pins: [CdevPin; 4] = pins
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected one pin per button"))?;
    Ok(ButtonPad::new(pins))
}
