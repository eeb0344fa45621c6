//! cpal output stream feeding a [`VoiceRenderer`].

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};

use step_sequencer::{
    engine::{MasterBus, RealtimeEngine, Waveform},
    MAX_BLOCK_SIZE,
};

/// Print every output device of the default host.
pub fn list_output_devices() -> EyreResult<()> {
    let host = cpal::default_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    println!("Output devices ({}):", host.id().name());
    for device in host.output_devices().wrap_err("failed to enumerate output devices")? {
        let name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        let marker = if Some(&name) == default_name.as_ref() { "*" } else { " " };
        println!(" {marker} {name}");
    }
    Ok(())
}

/// Open an output stream and return it running, with the engine half that
/// schedules into it.
///
/// The stream must stay alive for as long as the engine is in use.
pub fn open_output(
    device_name: Option<&str>,
    waveform: Waveform,
    gain: f32,
) -> EyreResult<(cpal::Stream, RealtimeEngine)> {
    let host = cpal::default_host();
    let device = match device_name {
        Some(wanted) => host
            .output_devices()
            .wrap_err("failed to enumerate output devices")?
            .find(|d| d.name().is_ok_and(|n| n == wanted))
            .ok_or_else(|| eyre!("no output device named {wanted:?}"))?,
        None => host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?,
    };
    let config = device
        .default_output_config()
        .wrap_err("failed to get default output config")?;

    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(eyre!(
            "unsupported sample format {:?}; only f32 output is supported",
            config.sample_format()
        ));
    }

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    log::info!(
        "output: {} @ {} Hz, {} channel(s)",
        device.name().unwrap_or_else(|_| "<unnamed>".into()),
        sample_rate,
        channels
    );

    let (engine, mut renderer) = RealtimeEngine::new(sample_rate, waveform, MasterBus::new(gain));
    let failure = engine.failure_flag();
    let mut block = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let mono = &mut block[..frames];
                renderer.render(mono);

                // mono to all channels
                let out_off = frames_written * channels;
                for (i, &s) in mono.iter().enumerate() {
                    let frame = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                    frame.fill(s);
                }

                frames_written += frames;
            }
        },
        move |err| {
            log::error!("audio stream error: {err}");
            failure.fail();
        },
        None,
    )?;

    stream.play().wrap_err("failed to start output stream")?;
    Ok((stream, engine))
}
