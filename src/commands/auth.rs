//! Auth command handlers: store and clear account credentials.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result, anyhow, bail};
use tracing::info;
use vier_core::auth::{PASSWORD_KEY, REFRESH_TOKEN_KEY, USERNAME_KEY};
use vier_core::{CredentialStore, EncryptedVault};

pub fn run_auth_login_command() -> Result<()> {
    let (username, password) = read_login_input()?;

    let vault = EncryptedVault::open_default()
        .map_err(|error| anyhow!("Failed to open credential vault: {error}"))?;
    vault
        .set(USERNAME_KEY, &username)
        .and_then(|()| vault.set(PASSWORD_KEY, &password))
        .map_err(|error| anyhow!("Failed to store credentials securely: {error}"))?;
    // A refresh token belongs to whichever account obtained it.
    vault
        .remove(REFRESH_TOKEN_KEY)
        .map_err(|error| anyhow!("Failed to drop stale refresh token: {error}"))?;

    info!(path = %vault.path().display(), "Saved encrypted credentials");
    Ok(())
}

pub fn run_auth_clear_command() -> Result<()> {
    let removed = EncryptedVault::clear_default()
        .map_err(|error| anyhow!("Failed to clear credential vault: {error}"))?;

    if removed {
        info!("Cleared stored credentials and tokens");
    } else {
        info!("No stored credentials found");
    }
    Ok(())
}

/// Reads the username and password as the first two lines of stdin.
fn read_login_input() -> Result<(String, String)> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut lines = stdin.lock().lines();

    let username = prompt_line(&mut lines, interactive, "Username: ")?;
    let password = prompt_line(&mut lines, interactive, "Password: ")?;
    Ok((username, password))
}

fn prompt_line<I>(lines: &mut I, interactive: bool, prompt: &str) -> Result<String>
where
    I: Iterator<Item = io::Result<String>>,
{
    if interactive {
        eprint!("{prompt}");
        io::stderr().flush().ok();
    }
    let line = lines
        .next()
        .transpose()
        .context("Failed to read stdin")?
        .unwrap_or_default();
    let value = line.trim();
    if value.is_empty() {
        bail!(
            "No {} provided\n  Suggestion: pipe two lines, e.g. `printf 'user\\npass\\n' | vier auth login`",
            prompt.trim_end_matches(": ").to_lowercase()
        );
    }
    Ok(value.to_string())
}
