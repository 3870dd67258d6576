//! Command orchestration from terminal actions to the backend command queue.

use std::{
    io::Write,
    time::{Duration, Instant},
};

use anyhow::bail;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use form_controller::FormState;

use crate::backend_bridge::commands::FormCommand;
use crate::controller::events::UiEvent;
use crate::render;

pub fn dispatch_form_command(cmd_tx: &Sender<FormCommand>, cmd: FormCommand, status: &mut String) {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued terminal->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "backend worker disconnected (possible startup/runtime failure)".to_string();
        }
    }
}

/// Terminal side of the bridge. Each `run` sends one command and blocks until
/// the worker reports the settled form.
pub struct FormSession {
    cmd_tx: Sender<FormCommand>,
    ui_rx: Receiver<UiEvent>,
    status: String,
    successes: usize,
    cancelled: bool,
}

impl FormSession {
    pub fn new(cmd_tx: Sender<FormCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            status: String::new(),
            successes: 0,
            cancelled: false,
        }
    }

    pub fn run(&mut self, cmd: FormCommand, out: &mut impl Write) -> anyhow::Result<FormState> {
        dispatch_form_command(&self.cmd_tx, cmd, &mut self.status);
        if !self.status.is_empty() {
            self.poll(out)?;
            bail!(std::mem::take(&mut self.status));
        }
        loop {
            match self.ui_rx.recv() {
                Ok(UiEvent::Settled(state)) => return Ok(state),
                Ok(event) => self.observe(event, out)?,
                Err(_) => bail!("backend worker stopped unexpectedly"),
            }
        }
    }

    /// Waits for a pending success callback. Returns `false` on timeout.
    pub fn wait_for_success(
        &mut self,
        timeout: Duration,
        out: &mut impl Write,
    ) -> anyhow::Result<bool> {
        let deadline = Instant::now() + timeout;
        let seen = self.successes;
        while self.successes == seen {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.ui_rx.recv_timeout(remaining) {
                Ok(event) => self.observe(event, out)?,
                Err(RecvTimeoutError::Timeout) => return Ok(false),
                Err(RecvTimeoutError::Disconnected) => bail!("backend worker stopped unexpectedly"),
            }
        }
        Ok(true)
    }

    /// Drains events that arrived between commands.
    pub fn poll(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.observe(event, out)?;
        }
        Ok(())
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn shutdown(self) {
        let mut status = String::new();
        dispatch_form_command(&self.cmd_tx, FormCommand::Shutdown, &mut status);
        if !status.is_empty() {
            tracing::debug!(%status, "shutdown not delivered");
        }
    }

    fn observe(&mut self, event: UiEvent, out: &mut impl Write) -> anyhow::Result<()> {
        match event {
            UiEvent::Error(err) => {
                tracing::warn!(context = err.context().as_str(), category = ?err.category(), "{}", err.message());
                writeln!(out, "error: {}", err.message())?;
            }
            UiEvent::Rendered(state) => {
                if let Some(line) = render::progress_line(&state) {
                    writeln!(out, "{line}")?;
                }
            }
            UiEvent::Settled(_) => {}
            UiEvent::Succeeded => {
                self.successes += 1;
                writeln!(out, "Integration settings applied.")?;
            }
            UiEvent::Cancelled => {
                self.cancelled = true;
                writeln!(out, "Cancelled.")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
