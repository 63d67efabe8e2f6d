//! Sweep response parsing.
//!
//! The firmware reports sensor faults in-band: a sample it could not
//! measure is sent as `ovf` (ADC overflow) or `nan`. Those degrade to a
//! zero sample. Anything else that is not a finite number makes the whole
//! capture unusable.

use super::{Channel, SWEEP_BLOCK_LINES, SWEEP_CHANNELS};
use crate::error::MalformedCapture;
use tracing::warn;

/// Tokens the sensor emits in place of a valid reading.
const SENTINEL_TOKENS: [&str; 2] = ["ovf", "nan"];

/// Ambient conditions reported alongside a reading.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ambient {
    /// Degrees Celsius; 0.0 when the field was empty.
    pub temperature: f64,
    /// Relative humidity in percent; `None` when not reported.
    pub humidity: Option<f64>,
}

/// One complete sweep: six equal-length channels plus ambient values.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepCapture {
    channels: [Vec<f64>; SWEEP_CHANNELS],
    ambient: Ambient,
}

impl SweepCapture {
    /// Build a capture from the raw lines of a sweep block.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, MalformedCapture> {
        if lines.len() != SWEEP_BLOCK_LINES {
            return Err(MalformedCapture::WrongLineCount {
                expected: SWEEP_BLOCK_LINES,
                found: lines.len(),
            });
        }

        let mut channels: [Vec<f64>; SWEEP_CHANNELS] = Default::default();
        for (channel, line) in Channel::ALL.into_iter().zip(lines) {
            channels[channel.index()] = parse_channel(channel, &sanitize_line(line.as_ref()))?;
        }

        let capture = Self {
            channels,
            ambient: parse_ambient(lines[SWEEP_CHANNELS].as_ref()),
        };
        capture.validate()?;
        Ok(capture)
    }

    /// Build a capture from already-parsed channels (wire order).
    pub fn new(
        channels: [Vec<f64>; SWEEP_CHANNELS],
        ambient: Ambient,
    ) -> Result<Self, MalformedCapture> {
        let capture = Self { channels, ambient };
        capture.validate()?;
        Ok(capture)
    }

    fn validate(&self) -> Result<(), MalformedCapture> {
        let expected = self.channels[0].len();
        for channel in Channel::ALL {
            let found = self.channels[channel.index()].len();
            if found == 0 {
                return Err(MalformedCapture::EmptyChannel { channel });
            }
            if found != expected {
                return Err(MalformedCapture::LengthMismatch {
                    channel,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Samples per channel.
    pub fn samples(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.channels[channel.index()]
    }

    /// Phase channel of pair `pair` (0..3).
    pub fn phase(&self, pair: usize) -> &[f64] {
        &self.channels[pair * 2]
    }

    /// Magnitude channel of pair `pair` (0..3).
    pub fn magnitude(&self, pair: usize) -> &[f64] {
        &self.channels[pair * 2 + 1]
    }

    pub fn ambient(&self) -> Ambient {
        self.ambient
    }

    /// Sample `row` of every channel, in column order.
    pub fn row(&self, row: usize) -> [f64; SWEEP_CHANNELS] {
        core::array::from_fn(|c| self.channels[c][row])
    }
}

/// Replace sentinel tokens with `0`, leaving every other token untouched.
pub fn sanitize_line(line: &str) -> String {
    line.split(',')
        .map(|token| {
            if SENTINEL_TOKENS.contains(&token.trim()) {
                "0"
            } else {
                token
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a sanitized, comma-separated data line.
///
/// An empty line yields an empty vector; the caller decides whether that
/// is acceptable. A single trailing comma is tolerated.
pub fn parse_channel(channel: Channel, line: &str) -> Result<Vec<f64>, MalformedCapture> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    let line = line.strip_suffix(',').unwrap_or(line);

    line.split(',')
        .map(|token| {
            let token = token.trim();
            match token.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(MalformedCapture::InvalidToken {
                    channel,
                    token: token.to_string(),
                }),
            }
        })
        .collect()
}

/// Parse a `temperature[&humidity]` line.
///
/// Empty temperature reads as 0.0, empty or absent humidity as `None`.
/// A line that does not parse at all, or carries a non-finite value,
/// degrades to `(0.0, None)`.
pub fn parse_ambient(line: &str) -> Ambient {
    let mut fields = line.split('&').map(str::trim);
    let temperature = fields.next().unwrap_or("");
    let humidity = fields.next().unwrap_or("");

    let parsed = (|| -> Option<Ambient> {
        Some(Ambient {
            temperature: if temperature.is_empty() {
                0.0
            } else {
                finite(temperature)?
            },
            humidity: if humidity.is_empty() {
                None
            } else {
                Some(finite(humidity)?)
            },
        })
    })();

    parsed.unwrap_or_else(|| {
        warn!("serial: unreadable ambient line {:?}", line);
        Ambient::default()
    })
}

fn finite(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn sentinels_sanitize_to_zero() {
        let line = sanitize_line("1,2,ovf,4,nan,6");
        assert_eq!(line, "1,2,0,4,0,6");
        assert_eq!(
            parse_channel(Channel::Phase1, &line).unwrap(),
            vec![1.0, 2.0, 0.0, 4.0, 0.0, 6.0]
        );
    }

    #[test]
    fn sentinel_match_is_whole_token() {
        assert_eq!(sanitize_line("nano,ovf2, ovf "), "nano,ovf2,0");
    }

    #[test]
    fn empty_line_parses_to_nothing() {
        assert!(parse_channel(Channel::Magnitude2, "").unwrap().is_empty());
        assert!(parse_channel(Channel::Magnitude2, "  ").unwrap().is_empty());
    }

    #[test]
    fn trailing_comma_and_spaces_are_tolerated() {
        assert_eq!(
            parse_channel(Channel::Phase2, " 1.5, -2 ,3e1,").unwrap(),
            vec![1.5, -2.0, 30.0]
        );
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert_eq!(
            parse_channel(Channel::Phase3, "1,x,3"),
            Err(MalformedCapture::InvalidToken {
                channel: Channel::Phase3,
                token: "x".to_string()
            })
        );
        assert!(parse_channel(Channel::Phase3, "1,,3").is_err());
        assert!(parse_channel(Channel::Phase3, "1,inf,3").is_err());
    }

    #[test]
    fn ambient_temperature_only() {
        assert_eq!(
            parse_ambient("23.5"),
            Ambient {
                temperature: 23.5,
                humidity: None
            }
        );
    }

    #[test]
    fn ambient_temperature_and_humidity() {
        assert_eq!(
            parse_ambient("23.5&41.0"),
            Ambient {
                temperature: 23.5,
                humidity: Some(41.0)
            }
        );
    }

    #[test]
    fn ambient_missing_temperature_defaults_to_zero() {
        assert_eq!(
            parse_ambient("&41.0"),
            Ambient {
                temperature: 0.0,
                humidity: Some(41.0)
            }
        );
        assert_eq!(parse_ambient("23.5&"), Ambient {
            temperature: 23.5,
            humidity: None
        });
        assert_eq!(parse_ambient(""), Ambient::default());
    }

    #[test]
    fn ambient_garbage_degrades() {
        assert_eq!(parse_ambient("warm&humid"), Ambient::default());
    }

    #[test]
    fn ambient_non_finite_degrades() {
        assert_eq!(parse_ambient("inf"), Ambient::default());
        assert_eq!(parse_ambient("21.0&NaN"), Ambient::default());
        assert_eq!(parse_ambient("-inf&40"), Ambient::default());
    }

    #[test]
    fn capture_from_full_block() {
        let lines = block(&[
            "1,2,3", "4,5,6", "7,8,9", "1,ovf,3", "nan,5,6", "7,8,9", "21.0&55",
        ]);
        let capture = SweepCapture::from_lines(&lines).unwrap();
        assert_eq!(capture.samples(), 3);
        assert_eq!(capture.phase(0), &[1.0, 2.0, 3.0]);
        assert_eq!(capture.magnitude(0), &[4.0, 5.0, 6.0]);
        assert_eq!(capture.magnitude(1), &[1.0, 0.0, 3.0]);
        assert_eq!(capture.phase(2), &[0.0, 5.0, 6.0]);
        assert_eq!(capture.row(1), [2.0, 5.0, 8.0, 0.0, 5.0, 8.0]);
        assert_eq!(capture.ambient().humidity, Some(55.0));
    }

    #[test]
    fn capture_with_missing_channels_is_rejected() {
        let lines = block(&["1,2,3", "4,5,6", "7,8,9", "", "", "", "21.0"]);
        assert_eq!(
            SweepCapture::from_lines(&lines),
            Err(MalformedCapture::EmptyChannel {
                channel: Channel::Magnitude2
            })
        );
    }

    #[test]
    fn capture_with_short_block_is_rejected() {
        let lines = block(&["1,2,3", "4,5,6", "7,8,9"]);
        assert_eq!(
            SweepCapture::from_lines(&lines),
            Err(MalformedCapture::WrongLineCount {
                expected: 7,
                found: 3
            })
        );
    }

    #[test]
    fn capture_with_ragged_channels_is_rejected() {
        let lines = block(&["1,2,3", "4,5,6", "7,8", "1,2,3", "4,5,6", "7,8,9", ""]);
        assert_eq!(
            SweepCapture::from_lines(&lines),
            Err(MalformedCapture::LengthMismatch {
                channel: Channel::Phase2,
                expected: 3,
                found: 2
            })
        );
    }
}
