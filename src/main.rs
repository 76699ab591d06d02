use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use boundcopy::config::{CopyOptions, OverflowPolicy, DEFAULT_CAPACITY};

#[derive(Parser)]
#[command(
    name = "boundcopy",
    version,
    about = "Copy one argument into a fixed 64-byte buffer and print it, refusing to overflow.",
    long_about = None
)]
struct Cli {
    /// Bytes to copy (nothing is copied or printed when omitted)
    #[arg(allow_hyphen_values = true)]
    input: Option<OsString>,

    /// What to do with input that does not fit: reject | truncate
    #[arg(long, default_value = "reject")]
    policy: String,

    /// Copy into a guard-page backed buffer instead of the stack frame
    #[arg(long, default_value_t = false)]
    guarded: bool,

    /// Buffer capacity in bytes, terminator included (needs --guarded unless 64)
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Reproduce the unchecked copy of LEN bytes and report (sandbox child mode)
    #[arg(long, hide = true, value_name = "LEN")]
    overflow_probe: Option<usize>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(boundcopy::exit_code_for(&err))
        }
    }
}

fn dispatch(cli: Cli) -> Result<u8> {
    let opts = CopyOptions {
        capacity: cli.capacity,
        policy: OverflowPolicy::parse(&cli.policy)?,
        guarded: cli.guarded,
    };

    if let Some(len) = cli.overflow_probe {
        return cmd_probe(len, &opts);
    }

    let input = cli.input.map(arg_bytes);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = boundcopy::run(input.as_deref(), &opts, &mut out)?;
    log::debug!("outcome: {outcome:?}");
    Ok(outcome.exit_code())
}

#[cfg(unix)]
fn cmd_probe(len: usize, opts: &CopyOptions) -> Result<u8> {
    use anyhow::Context;

    opts.validate()?;
    let report = boundcopy::fixture::probe_in_process(len, opts.capacity)?;
    let json = serde_json::to_string(&report).context("serialize probe report")?;
    println!("{json}");
    Ok(boundcopy::EXIT_OK)
}

#[cfg(not(unix))]
fn cmd_probe(_len: usize, _opts: &CopyOptions) -> Result<u8> {
    anyhow::bail!("The overflow probe needs a guard page and is only available on Unix.")
}

#[cfg(unix)]
fn arg_bytes(arg: OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    arg.into_vec()
}

#[cfg(not(unix))]
fn arg_bytes(arg: OsString) -> Vec<u8> {
    arg.to_string_lossy().into_owned().into_bytes()
}
