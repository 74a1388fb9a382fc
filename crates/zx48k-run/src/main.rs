//! Headless ZX Spectrum 48K runner: boots a ROM, optionally loads a snapshot,
//! runs frames under breakpoints and watchpoints, and prints a JSON dump of the
//! machine as a generic debugger sees it.

mod dump;
mod headless;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, ensure, Context};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use zx48k_core::debug::{set_debugger, DebuggerIf, DEBUGGER_IF_VERSION, NULL_HANDLE};
use zx48k_core::{JoystickType, MachineConfig, RunState, Spectrum48k};

use dump::{describe, MemoryWindow, SystemDump};
use headless::{HeadlessFrontend, OutputStats};

#[derive(Parser, Debug)]
#[command(
    name = "zx48k-run",
    version,
    about = "Run a ZX Spectrum 48K headless and dump its state as JSON."
)]
struct Args {
    /// 16 KiB ROM image
    rom: PathBuf,

    /// 48K `.sna` snapshot to load after power-on
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// TOML machine configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// CPU clock in Hz, overriding the config file
    #[arg(long, value_name = "HZ")]
    clock_hz: Option<u32>,

    /// Frame period in microseconds, overriding the config file
    #[arg(long, value_name = "US")]
    frame_us: Option<u32>,

    /// Disconnect the Kempston joystick
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_joystick: bool,

    /// Log debugger and pacing events when `RUST_LOG` is unset
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    /// Host frames to run; stops early when a breakpoint or watchpoint trips
    #[arg(long, default_value_t = 50)]
    frames: u32,

    /// Breakpoint address (decimal or 0x-prefixed hex); repeatable
    #[arg(long = "break", value_name = "ADDR", value_parser = parse_address)]
    break_points: Vec<u16>,

    /// Write watchpoint over ADDR[:LEN] of the main region; repeatable
    #[arg(long = "watch", value_name = "ADDR[:LEN]", value_parser = parse_window)]
    watch_points: Vec<MemoryWindow>,

    /// Single instructions to step after the frames
    #[arg(long, default_value_t = 0)]
    step: u32,

    /// Main-region bytes ADDR[:LEN] to include in the dump
    #[arg(long, value_name = "ADDR[:LEN]", value_parser = parse_window)]
    peek: Option<MemoryWindow>,

    /// Write the final state as a `.sna` snapshot
    #[arg(long, value_name = "PATH")]
    save_snapshot: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Report {
    instance: u64,
    frames_run: u32,
    boundaries: u64,
    run_state: RunState,
    output: OutputStats,
    system: SystemDump,
}

fn parse_number(text: &str) -> Result<u64, String> {
    let parsed = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).map_or_else(
        || text.parse::<u64>(),
        |hex| u64::from_str_radix(hex, 16),
    );
    parsed.map_err(|err| format!("invalid number `{text}`: {err}"))
}

fn parse_address(text: &str) -> Result<u16, String> {
    let value = parse_number(text)?;
    u16::try_from(value)
        .map_err(|_| format!("address {value:#x} is outside the 64 KiB address space"))
}

fn parse_window(text: &str) -> Result<MemoryWindow, String> {
    let (start, length) = match text.split_once(':') {
        Some((start, length)) => (parse_number(start)?, parse_number(length)?),
        None => (parse_number(text)?, 1),
    };
    if length == 0 {
        return Err(format!("empty range `{text}`"));
    }
    Ok(MemoryWindow { start, length })
}

fn load_config(args: &Args) -> anyhow::Result<MachineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => MachineConfig::default(),
    };
    if let Some(clock_hz) = args.clock_hz {
        config.clock_hz = clock_hz;
    }
    if let Some(frame_us) = args.frame_us {
        config.frame_us = frame_us;
    }
    if args.no_joystick {
        config.joystick = JoystickType::None;
    }
    config.validate().context("invalid machine configuration")?;
    Ok(config)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let rom = fs::read(&args.rom).with_context(|| format!("reading ROM {}", args.rom.display()))?;
    let (frontend, stats) = HeadlessFrontend::new();
    let mut machine = Spectrum48k::new(&rom, config, Box::new(frontend))?;

    if let Some(path) = &args.snapshot {
        let content =
            fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
        machine
            .load_content(Some(&content))
            .with_context(|| format!("loading snapshot {}", path.display()))?;
    }

    let mut record = DebuggerIf::new(DEBUGGER_IF_VERSION);
    let Some(handle) = set_debugger(&mut machine, &mut record) else {
        bail!("debugger interface version {DEBUGGER_IF_VERSION} refused");
    };
    let Some(system) = record.system else {
        bail!("debugger handshake returned no system descriptor");
    };
    let Some(cpu) = system.main_cpu() else {
        bail!("system `{}` has no main CPU", system.description);
    };

    for &addr in &args.break_points {
        let handle = cpu.request_break_point(&mut machine, 0, u64::from(addr));
        ensure!(handle != NULL_HANDLE, "breakpoint at {addr:#06x} refused");
        debug!(addr, handle, "breakpoint set");
    }
    if !args.watch_points.is_empty() {
        let Some(region) = cpu.main_region() else {
            bail!("CPU `{}` has no main region to watch", cpu.description);
        };
        for window in &args.watch_points {
            let handle =
                region.request_watch_point(&mut machine, 0, window.start, window.length, false, true);
            ensure!(
                handle != NULL_HANDLE,
                "watchpoint at {:#06x}+{} refused",
                window.start,
                window.length
            );
            debug!(start = window.start, length = window.length, handle, "watchpoint set");
        }
    }

    let mut frames_run = 0;
    while frames_run < args.frames {
        machine.run_frame();
        frames_run += 1;
        if let RunState::Paused(reason) = machine.run_state() {
            info!(?reason, pc = machine.cpu().regs.pc, frames_run, "stopped");
            break;
        }
    }
    if let Some(step) = cpu.step {
        for _ in 0..args.step {
            step(&mut machine, 0);
        }
    }

    if let Some(path) = &args.save_snapshot {
        fs::write(path, machine.snapshot().to_bytes())
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        info!(path = %path.display(), "snapshot saved");
    }

    let report = Report {
        instance: handle.get(),
        frames_run,
        boundaries: machine.pacer().boundaries_crossed(),
        run_state: machine.run_state(),
        output: *stats.borrow(),
        system: describe(system, &machine, args.peek),
    };
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).context("writing report")?;
    writeln!(stdout).context("writing report")?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_config, parse_address, parse_window, Args};
    use crate::dump::MemoryWindow;
    use clap::Parser;
    use std::fs;
    use zx48k_core::JoystickType;

    #[test]
    fn addresses_accept_decimal_and_hex() {
        assert_eq!(parse_address("16384"), Ok(0x4000));
        assert_eq!(parse_address("0x5C00"), Ok(0x5C00));
        assert!(parse_address("0x10000").is_err());
        assert!(parse_address("lots").is_err());
    }

    #[test]
    fn windows_default_to_one_byte() {
        assert_eq!(
            parse_window("0x8000"),
            Ok(MemoryWindow {
                start: 0x8000,
                length: 1
            })
        );
        assert_eq!(
            parse_window("0x4000:6912"),
            Ok(MemoryWindow {
                start: 0x4000,
                length: 6912
            })
        );
        assert!(parse_window("0x4000:0").is_err());
    }

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(["zx48k-run", "48.rom"].into_iter().chain(extra.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("machine.toml");
        fs::write(&path, "clock_hz = 14000\njoystick = \"none\"\n").expect("write config");

        let config = load_config(&args(&["--config", path.to_str().expect("utf-8 path")]))
            .expect("valid config");
        assert_eq!(config.frame_quantum(), 280);
        assert_eq!(config.joystick, JoystickType::None);
        assert_eq!(config.frame_us, 20_000);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("machine.toml");
        fs::write(&path, "clock_hz = 14000\n").expect("write config");

        let config = load_config(&args(&[
            "--config",
            path.to_str().expect("utf-8 path"),
            "--clock-hz",
            "3500000",
            "--no-joystick",
        ]))
        .expect("valid config");
        assert_eq!(config.clock_hz, 3_500_000);
        assert_eq!(config.joystick, JoystickType::None);
    }

    #[test]
    fn config_is_validated() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("machine.toml");
        fs::write(&path, "frame_us = 0\n").expect("write config");
        assert!(load_config(&args(&["--config", path.to_str().expect("utf-8 path")])).is_err());
        assert!(load_config(&args(&["--clock-hz", "0"])).is_err());
    }
}
