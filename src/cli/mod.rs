use clap::Parser;
use std::path::{Path, PathBuf};

use crate::error::{Result, WarpError};

pub const DEFAULT_DIR: &str = "~/.cf-warp";

#[derive(Parser, Debug)]
#[command(name = "cf-warp")]
#[command(about = "A simple cli to get Warp+ as WireGuard configuration.")]
#[command(long_about = "A simple cli to get Warp+ as WireGuard configuration.

Run command to generate Warp credentials and WireGuard configuration.
Run command with configuration files in place to view Warp+ quota.
Run command with a number to increment Warp+ quota with that many fake referrals.")]
pub struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = DEFAULT_DIR)]
    pub dir: String,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of fake referrals to perform; anything non-numeric or negative means none
    #[arg(allow_negative_numbers = true)]
    pub referral: Option<String>,
}

impl Cli {
    pub fn referral_count(&self) -> u32 {
        self.referral.as_deref().map(parse_referral_count).unwrap_or(0)
    }

    pub fn storage_dir(&self) -> Result<PathBuf> {
        expand_home(&self.dir, dirs::home_dir().as_deref())
    }
}

/// Lenient count parsing: leading digits are used, anything else is zero.
/// "10" and "10gb" give 10; "ten", "" and "-3" give 0.
pub fn parse_referral_count(input: &str) -> u32 {
    let s = input.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u32::MAX)
}

/// Expand a leading `~` to the home directory
pub fn expand_home(dir: &str, home: Option<&Path>) -> Result<PathBuf> {
    let rest = match dir.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(PathBuf::from(dir)),
    };
    let home = home.ok_or(WarpError::HomeDirUnavailable)?;
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        Ok(home.to_path_buf())
    } else {
        Ok(home.join(rest))
    }
}
