use anyhow::Result;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentArgs {
    pub snapshot: PathBuf,
    pub socket: Option<PathBuf>,
    pub once: bool,
    pub raw: bool,
    pub seed: Option<u64>,
    /// Persist the effective settings after applying command-line overrides.
    pub save_settings: bool,
}

pub fn parse_args() -> Result<AgentArgs> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<AgentArgs>
where
    I: IntoIterator<Item = OsString>,
{
    let mut snapshot = None;
    let mut socket = None;
    let mut once = false;
    let mut raw = false;
    let mut seed = None;
    let mut save_settings = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--snapshot" {
            let Some(path) = args.next() else {
                anyhow::bail!("--snapshot expects a path");
            };
            snapshot = Some(PathBuf::from(path));
        } else if arg == "--socket" {
            let Some(path) = args.next() else {
                anyhow::bail!("--socket expects a path");
            };
            socket = Some(PathBuf::from(path));
        } else if arg == "--seed" {
            let Some(value) = args.next() else {
                anyhow::bail!("--seed expects a number");
            };
            let value = value.to_string_lossy();
            seed = Some(
                value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid seed: {value}"))?,
            );
        } else if arg == "--once" {
            once = true;
        } else if arg == "--raw" {
            raw = true;
        } else if arg == "--save-settings" {
            save_settings = true;
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    let Some(snapshot) = snapshot else {
        anyhow::bail!("--snapshot <path> is required");
    };

    Ok(AgentArgs {
        snapshot,
        socket,
        once,
        raw,
        seed,
        save_settings,
    })
}
