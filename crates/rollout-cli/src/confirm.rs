//! Confirmation prompt before touching a production-like target.

use std::io::IsTerminal;

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};

/// Ask before deploying into a non-sandbox target.
///
/// Without a terminal there is nobody to ask, so the deployment is refused
/// and `--yes` is required.
pub fn confirm_deployment(target: &str) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        anyhow::bail!(
            "{} is not a sandbox; pass --yes to deploy without confirmation",
            target
        );
    }

    println!(
        "{} {} is not a sandbox environment.",
        style("!").yellow().bold(),
        style(target).bold()
    );
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Deploy into {}?", target))
        .default(false)
        .interact()?;
    Ok(confirmed)
}
