//! Command-line flags, `--key=value` style.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use std::{str::FromStr, time::Duration};

use step_sequencer::{engine::Waveform, SequencerConfig};

#[derive(Debug)]
pub struct Args {
    pub list_devices: bool,
    pub device_name: Option<String>,
    pub steps: Vec<f32>,
    pub step_length: f64,
    pub config: SequencerConfig,
    pub waveform: Waveform,
    pub gain: f32,
    /// Stop after this long; run until killed when absent
    pub duration: Option<Duration>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            list_devices: false,
            device_name: None,
            steps: vec![440.0, 660.0, 440.0, 400.0],
            step_length: 1.0,
            config: SequencerConfig::default(),
            waveform: Waveform::Sine,
            gain: 0.5,
            duration: None,
        }
    }
}

impl Args {
    pub fn parse() -> EyreResult<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    pub fn parse_from(args: impl IntoIterator<Item = String>) -> EyreResult<Self> {
        let mut a = Args::default();

        for arg in args {
            if arg == "--list-devices" {
                a.list_devices = true;
                continue;
            }

            let Some((key, value)) = arg.split_once('=') else {
                log::warn!("ignoring unknown arg: {arg}");
                continue;
            };

            match key {
                "--device" => a.device_name = Some(value.to_string()),
                "--steps" => {
                    a.steps = value
                        .split(',')
                        .map(|f| parse_value::<f32>("--steps", f.trim()))
                        .collect::<EyreResult<_>>()?;
                }
                "--step-length" => a.step_length = parse_value(key, value)?,
                "--start-offset" => a.config.start_offset = parse_value(key, value)?,
                "--lookahead" => a.config.lookahead_offset = parse_value(key, value)?,
                "--poll-ms" => {
                    a.config.poll_interval = Duration::from_millis(parse_value(key, value)?)
                }
                "--waveform" => a.waveform = value.parse().map_err(|e: String| eyre!(e))?,
                "--gain" => a.gain = parse_value(key, value)?,
                "--duration" => {
                    let seconds: f64 = parse_value(key, value)?;
                    let duration = Duration::try_from_secs_f64(seconds)
                        .wrap_err_with(|| format!("invalid value for {key}: {value:?}"))?;
                    a.duration = Some(duration);
                }
                _ => log::warn!("ignoring unknown arg: {arg}"),
            }
        }

        Ok(a)
    }
}

fn parse_value<T>(key: &str, value: &str) -> EyreResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .wrap_err_with(|| format!("invalid value for {key}: {value:?}"))
}
