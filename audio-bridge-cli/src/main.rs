mod cli;
mod delegate;
mod device;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use audio_bridge_core::storage::report::write_report;
use audio_bridge_core::{
    BridgeConfiguration, FrameSource, OutputDevice, PipelineSession, TerminationReason, ToneSource,
};

use cli::{Cli, SourceKind};
use delegate::LogDelegate;
use device::CliDevice;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code.clamp(0, u8::MAX as i32) as u8),
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config = cli.configuration()?;
    let device = CliDevice::from_address(&config.device_id)?;

    match cli.source {
        SourceKind::Tone => {
            let source = ToneSource::new(
                config.sample_rate,
                config.channels as usize,
                config.buffer_frames as usize,
                cli.tone_hz,
            );
            bridge(source, device, config, cli)
        }
        SourceKind::Jack => run_jack(device, config, cli),
    }
}

#[cfg(all(target_os = "linux", feature = "jack"))]
fn run_jack(device: CliDevice, config: BridgeConfiguration, cli: &Cli) -> Result<i32> {
    let source = audio_bridge_jack::JackSource::open(&cli.client_name, config.channels as usize)
        .context("cannot connect to the JACK server")?;
    bridge(source, device, config, cli)
}

#[cfg(not(all(target_os = "linux", feature = "jack")))]
fn run_jack(_device: CliDevice, _config: BridgeConfiguration, _cli: &Cli) -> Result<i32> {
    anyhow::bail!("this build has no JACK support (rebuild on Linux with --features jack)")
}

/// Run one session to completion and turn its report into an exit status.
fn bridge<S, D>(source: S, device: D, config: BridgeConfiguration, cli: &Cli) -> Result<i32>
where
    S: FrameSource,
    D: OutputDevice + 'static,
{
    let mut session = PipelineSession::new(source, device, config)?;
    session.set_delegate(Arc::new(LogDelegate));

    let termination = session.termination_handle();
    ctrlc::set_handler(move || {
        termination.terminate(TerminationReason::Signal);
    })
    .context("failed to install signal handler")?;

    let report = session.run().context("bridge failed to start")?;

    if let Some(ref path) = cli.report {
        write_report(&report, path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }
    if let Some(message) = report.diagnostic() {
        eprintln!("{}", message);
    }
    Ok(report.exit_code())
}
