// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};

pub const USAGE: &str = "usage: tunescope [--config <path>] <check|explore|rate-limits>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Verify credentials and connectivity.
    Check,
    /// Walk through the search, artist, playlist, audio-features and
    /// categories endpoints.
    Explore,
    /// Probe rate-limit behaviour and inspect response structure.
    RateLimits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config_path: Option<PathBuf>,
    pub command: Command,
}

impl Args {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config_path = None;
        let mut command = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("--config requires a path\n{USAGE}"))?;
                    config_path = Some(PathBuf::from(path));
                }
                "check" | "explore" | "rate-limits" if command.is_some() => {
                    bail!("only one command may be given\n{USAGE}");
                }
                "check" => command = Some(Command::Check),
                "explore" => command = Some(Command::Explore),
                "rate-limits" => command = Some(Command::RateLimits),
                other => bail!("unrecognized argument `{other}`\n{USAGE}"),
            }
        }

        Ok(Self {
            config_path,
            command: command.ok_or_else(|| anyhow!("missing command\n{USAGE}"))?,
        })
    }
}
