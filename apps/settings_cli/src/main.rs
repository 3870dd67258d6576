mod backend_bridge;
mod controller;
mod render;
mod settings;
mod shell;
#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::IntegrationClient;
use crossbeam_channel::bounded;
use form_controller::{DraftField, FormState};
use shared::domain::BusinessId;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::FormCommand;
use crate::controller::{events::UiEvent, orchestration::FormSession};
use crate::settings::{load_settings, Settings};
use crate::shell::ShellInput;

/// Grace period on top of the success delay before giving up on the callback.
const SUCCESS_WAIT_SLACK: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "shopify-settings", about = "Manage a business's Shopify store integration")]
struct Args {
    /// TOML settings file (defaults to ./shopify-settings.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    #[arg(long, global = true)]
    business_id: Option<String>,
    #[arg(long, global = true)]
    success_delay_ms: Option<u64>,
    #[arg(long, global = true)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current integration status
    Status,
    /// Save the store configuration
    Save {
        #[arg(long)]
        store_url: String,
        /// Omit to keep the stored token
        #[arg(long)]
        access_token: Option<String>,
        #[arg(long)]
        api_version: Option<String>,
    },
    /// Test the stored connection
    Test,
    /// Remove the integration
    Disconnect {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Edit the form interactively
    Shell,
}

impl Args {
    fn apply_overrides(&self, settings: &mut Settings) -> Result<()> {
        if let Some(v) = &self.api_base_url {
            settings.set("api_base_url", v)?;
        }
        if let Some(v) = &self.business_id {
            settings.set("business_id", v)?;
        }
        if let Some(v) = self.success_delay_ms {
            settings.success_delay = Duration::from_millis(v);
        }
        if let Some(v) = &self.log_filter {
            settings.set("log_filter", v)?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply_overrides(&mut settings)?;
    settings.validate()?;

    let filter = EnvFilter::try_new(&settings.log_filter)
        .with_context(|| format!("invalid log filter '{}'", settings.log_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let business_id = settings.business_id.clone().context(
        "no business id configured; pass --business-id or set SHOPIFY_SETTINGS_BUSINESS_ID",
    )?;

    let mut client = IntegrationClient::new(&settings.api_base_url)?;
    if let Some(token) = settings.api_token.clone() {
        client = client.with_api_token(token);
    }

    let (cmd_tx, cmd_rx) = bounded::<FormCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    let worker =
        backend_bridge::runtime::launch(cmd_rx, ui_tx, Arc::new(client), settings.success_delay);

    let mut session = FormSession::new(cmd_tx, ui_rx);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = run_command(
        &mut session,
        &args.command,
        business_id,
        settings.success_delay,
        &mut out,
    );

    session.shutdown();
    if worker.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    result
}

fn run_command(
    session: &mut FormSession,
    command: &Command,
    business_id: BusinessId,
    success_delay: Duration,
    out: &mut impl Write,
) -> Result<()> {
    let state = session.run(FormCommand::Mount { business_id }, out)?;

    match command {
        Command::Status => {
            write!(out, "{}", render::render_form(&state))?;
            finish(&state)
        }
        Command::Save {
            store_url,
            access_token,
            api_version,
        } => {
            if state.error().is_some() {
                write!(out, "{}", render::render_form(&state))?;
                return finish(&state);
            }
            edit(session, DraftField::StoreUrl, store_url, out)?;
            if let Some(token) = access_token {
                edit(session, DraftField::AccessToken, token, out)?;
            }
            if let Some(version) = api_version {
                edit(session, DraftField::ApiVersion, version, out)?;
            }
            let state = session.run(FormCommand::Save, out)?;
            write!(out, "{}", render::render_form(&state))?;
            await_success(session, &state, success_delay, out)?;
            finish(&state)
        }
        Command::Test => {
            if !state.is_integrated() {
                write!(out, "{}", render::render_form(&state))?;
                bail!("no Shopify store is connected");
            }
            let state = session.run(FormCommand::TestConnection, out)?;
            write!(out, "{}", render::render_form(&state))?;
            finish(&state)
        }
        Command::Disconnect { yes } => {
            if !state.is_integrated() {
                write!(out, "{}", render::render_form(&state))?;
                bail!("no Shopify store is connected");
            }
            let state = session.run(FormCommand::RequestDelete, out)?;
            let state = confirm_delete(session, &state, *yes, out)?;
            write!(out, "{}", render::render_form(&state))?;
            await_success(session, &state, success_delay, out)?;
            finish(&state)
        }
        Command::Shell => run_shell(session, state, out),
    }
}

fn edit(
    session: &mut FormSession,
    field: DraftField,
    value: &str,
    out: &mut impl Write,
) -> Result<FormState> {
    session.run(
        FormCommand::Edit {
            field,
            value: value.to_string(),
        },
        out,
    )
}

/// Blocks on a terminal prompt unless `assume_yes` is set.
fn confirm_delete(
    session: &mut FormSession,
    state: &FormState,
    assume_yes: bool,
    out: &mut impl Write,
) -> Result<FormState> {
    if !state.confirming_delete {
        return Ok(state.clone());
    }
    let confirmed = assume_yes || {
        let store = state
            .status
            .summary()
            .map(|summary| summary.store_url.as_str())
            .unwrap_or("the store");
        write!(out, "Disconnect {store}? This removes the stored access token. [y/N] ")?;
        out.flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        shell::is_confirmation(&answer)
    };
    let cmd = if confirmed {
        FormCommand::ConfirmDelete
    } else {
        FormCommand::DeclineDelete
    };
    session.run(cmd, out)
}

fn await_success(
    session: &mut FormSession,
    state: &FormState,
    success_delay: Duration,
    out: &mut impl Write,
) -> Result<()> {
    if state.success().is_none() {
        return Ok(());
    }
    if !session.wait_for_success(success_delay + SUCCESS_WAIT_SLACK, out)? {
        tracing::warn!("success callback did not fire before shutdown");
    }
    Ok(())
}

fn finish(state: &FormState) -> Result<()> {
    match state.error() {
        Some(message) => bail!("{message}"),
        None => Ok(()),
    }
}

fn run_shell(session: &mut FormSession, mut state: FormState, out: &mut impl Write) -> Result<()> {
    write!(out, "{}", render::render_form(&state))?;
    writeln!(out, "type 'help' for commands")?;

    let stdin = io::stdin();
    loop {
        session.poll(out)?;
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            session.run(FormCommand::Cancel, out)?;
            return Ok(());
        }

        let input = match shell::parse_line(&line) {
            Ok(input) => input,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };
        state = match input {
            ShellInput::Empty => continue,
            ShellInput::Help => {
                writeln!(out, "{}", shell::HELP)?;
                continue;
            }
            ShellInput::Show => state,
            ShellInput::Edit { field, value } => {
                session.run(FormCommand::Edit { field, value }, out)?
            }
            ShellInput::Save => session.run(FormCommand::Save, out)?,
            ShellInput::Test => {
                if !state.is_integrated() {
                    writeln!(out, "no Shopify store is connected")?;
                    continue;
                }
                session.run(FormCommand::TestConnection, out)?
            }
            ShellInput::Disconnect => {
                let requested = session.run(FormCommand::RequestDelete, out)?;
                if !requested.confirming_delete {
                    writeln!(out, "nothing to disconnect")?;
                    continue;
                }
                confirm_delete(session, &requested, false, out)?
            }
            ShellInput::Cancel => {
                session.run(FormCommand::Cancel, out)?;
                return Ok(());
            }
        };
        write!(out, "{}", render::render_form(&state))?;
        if session.cancelled() {
            return Ok(());
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
