//! stepseq - loop a step sequence on the default output device
//!
//! Run with: cargo run -- --steps=440,660,440,400 --step-length=0.5

mod args;
mod audio;

use std::{thread, time::Duration};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use step_sequencer::{StepSequencer, Transport};

use args::Args;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse()?;
    if args.list_devices {
        return audio::list_output_devices();
    }

    let (_stream, engine) = audio::open_output(args.device_name.as_deref(), args.waveform, args.gain)?;

    let mut transport = Transport::new(StepSequencer::new(engine, args.config.clone()));
    transport
        .configure(args.steps.iter().copied(), args.step_length)
        .wrap_err("invalid sequence")?;
    transport.play().wrap_err("failed to start sequencer")?;

    log::info!(
        "playing {} step(s) of {}s; ctrl-c to quit",
        args.steps.len(),
        args.step_length
    );

    match args.duration {
        Some(duration) => {
            thread::sleep(duration);
            transport.stop();

            let (committed, dropped) = transport.with_sequencer(|s| {
                (s.notes_committed(), s.engine().dropped_voices())
            });
            log::info!("stopped after {committed} note(s), {dropped} dropped");

            // let the last scheduled note ring out
            let tail = args.config.lookahead_offset + args.step_length;
            thread::sleep(Duration::from_secs_f64(tail.max(0.0)));
        }
        None => loop {
            thread::sleep(Duration::from_millis(100));
        },
    }

    Ok(())
}
