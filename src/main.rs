//! Network Governor CLI
//!
//! Drives the governing library against a simulated network: maps the
//! topology, roots what the tools reach, and runs the weaken or
//! hack-grow-weaken cycle.
//!
//! # Output Format
//!
//! Human-readable mode output is written to stdout. Run counters are written
//! to stderr upon completion as a single line:
//! `mode=<mode> elapsed_ms=N jobs=N ... idle=N`
//!
//! # Exit Codes
//!
//! - `0`: Success
//! - `1`: Governing run aborted (refused dispatch handle)
//! - `2`: Invalid arguments or unreadable scenario

use std::env;
use std::fs;
use std::io;
use std::process::ExitCode;

use autohack_rs::demo::demo_spec;
use autohack_rs::env::Environment;
use autohack_rs::governor::{GovernorConfig, HgwFarm, WeakenSweep};
use autohack_rs::rooting::{self, RootStatus};
use autohack_rs::sim::{SimNet, SimNetSpec};
use autohack_rs::topology;

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS] <mode>

MODES:
    map       Print the discovered network
    root      Crack and nuke every reachable node
    weaken    Drive every eligible target to its security floor
    farm      Run the hack-grow-weaken cycle until the duration elapses

OPTIONS:
    --spec=<FILE>        Load a JSON network scenario instead of the demo
    --seed=<N>           Override the scenario RNG seed
    --duration-ms=<N>    Farm runtime in simulated ms (default: 120000)
    --path               map: print full paths instead of hostnames
    --show-all           root: include nodes that stayed locked
    --help, -h           Show this help message",
        exe.to_string_lossy()
    );
}

struct Options {
    mode: String,
    spec_path: Option<String>,
    seed: Option<u64>,
    duration_ms: u64,
    show_paths: bool,
    show_all: bool,
}

fn parse_args() -> Result<Options, ()> {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "autohack-rs".into());

    let mut mode: Option<String> = None;
    let mut spec_path: Option<String> = None;
    let mut seed: Option<u64> = None;
    let mut duration_ms: u64 = 120_000;
    let mut show_paths = false;
    let mut show_all = false;

    for arg in args {
        let Some(flag) = arg.to_str() else {
            eprintln!("invalid argument: {}", arg.to_string_lossy());
            return Err(());
        };

        if let Some(value) = flag.strip_prefix("--spec=") {
            spec_path = Some(value.to_owned());
        } else if let Some(value) = flag.strip_prefix("--seed=") {
            let n: u64 = value.parse().map_err(|_| {
                eprintln!("invalid --seed value: {value}");
            })?;
            seed = Some(n);
        } else if let Some(value) = flag.strip_prefix("--duration-ms=") {
            let n: u64 = value.parse().map_err(|_| {
                eprintln!("invalid --duration-ms value: {value}");
            })?;
            duration_ms = n;
        } else if flag == "--path" {
            show_paths = true;
        } else if flag == "--show-all" {
            show_all = true;
        } else if flag == "--help" || flag == "-h" {
            print_usage(&exe);
            std::process::exit(0);
        } else if flag.starts_with('-') {
            eprintln!("unknown option: {flag}");
            print_usage(&exe);
            return Err(());
        } else if mode.is_none() {
            mode = Some(flag.to_owned());
        } else {
            eprintln!("unexpected argument: {flag}");
            return Err(());
        }
    }

    let Some(mode) = mode else {
        print_usage(&exe);
        return Err(());
    };

    Ok(Options {
        mode,
        spec_path,
        seed,
        duration_ms,
        show_paths,
        show_all,
    })
}

fn load_net(opts: &Options) -> io::Result<SimNet> {
    let mut spec = match &opts.spec_path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            SimNetSpec::from_json(&json)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        }
        None => demo_spec(opts.seed.unwrap_or(1)),
    };
    if let Some(seed) = opts.seed {
        spec.seed = seed;
    }
    Ok(SimNet::from_spec(&spec))
}

fn map_mode(net: &SimNet, show_paths: bool) {
    let records = topology::discover(net, "home");

    let label = |r: &autohack_rs::NodeRecord| {
        if show_paths {
            r.path.clone()
        } else {
            r.hostname.clone()
        }
    };
    let width = records.iter().map(|r| label(r).len()).max().unwrap_or(0);

    for record in &records {
        let rooted = net.node(&record.hostname).rooted;
        println!("{:width$}  {}", label(record), rooted, width = width);
    }
}

fn root_mode(net: &mut SimNet, show_all: bool) {
    let (outcomes, report) = rooting::sweep(net, "home");

    for outcome in &outcomes {
        let (bang, rooted) = match outcome.status {
            RootStatus::NewlyRooted => ("!", "Y"),
            RootStatus::AlreadyRooted => (" ", "Y"),
            RootStatus::StillLocked => {
                if !show_all {
                    continue;
                }
                (" ", " ")
            }
        };
        println!("{bang} {rooted} {}", outcome.record.hostname);
    }

    println!(
        "rooted {}/{} (+{} this sweep)",
        report.rooted_total(),
        outcomes.len(),
        report.newly_rooted
    );
}

fn main() -> ExitCode {
    let Ok(opts) = parse_args() else {
        return ExitCode::from(2);
    };

    let mut net = match load_net(&opts) {
        Ok(net) => net,
        Err(e) => {
            eprintln!("failed to load scenario: {e}");
            return ExitCode::from(2);
        }
    };

    match opts.mode.as_str() {
        "map" => {
            map_mode(&net, opts.show_paths);
            ExitCode::SUCCESS
        }
        "root" => {
            root_mode(&mut net, opts.show_all);
            ExitCode::SUCCESS
        }
        "weaken" => {
            // Root first so newly reachable nodes join the sweep.
            rooting::sweep(&mut net, "home");
            let mut sweep = WeakenSweep::new(&net, GovernorConfig::default());
            match sweep.run(&mut net) {
                Ok(report) => {
                    println!("levelled {} targets", report.targets_levelled);
                    eprintln!(
                        "mode=weaken elapsed_ms={} {}",
                        net.now_ms(),
                        report.metrics.stats_line()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("weaken sweep aborted: {e}");
                    ExitCode::from(1)
                }
            }
        }
        "farm" => {
            rooting::sweep(&mut net, "home");
            let mut farm = HgwFarm::new(&net, GovernorConfig::default());
            match farm.run_until(&mut net, opts.duration_ms) {
                Ok(report) => {
                    println!(
                        "extracted {:.0} across {} targets",
                        net.stolen_total(),
                        report.targets
                    );
                    eprintln!(
                        "mode=farm elapsed_ms={} {}",
                        net.now_ms(),
                        report.metrics.stats_line()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("farm aborted: {e}");
                    ExitCode::from(1)
                }
            }
        }
        other => {
            eprintln!("unknown mode: {other}");
            ExitCode::from(2)
        }
    }
}
