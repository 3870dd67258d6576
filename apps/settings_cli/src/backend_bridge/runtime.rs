//! Backend worker: owns the tokio runtime and the form controller, and turns
//! queued commands into controller calls.

use std::{sync::Arc, thread, time::Duration};

use client_core::IntegrationApi;
use crossbeam_channel::{Receiver, Sender};
use form_controller::{FormHooks, FormState, IntegrationFormController, UiError, UiErrorContext};

use crate::backend_bridge::commands::FormCommand;
use crate::controller::events::UiEvent;

pub fn launch(
    cmd_rx: Receiver<FormCommand>,
    ui_tx: Sender<UiEvent>,
    api: Arc<dyn IntegrationApi>,
    success_delay: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut controller = IntegrationFormController::new(api, hooks_for(&ui_tx))
                .with_success_delay(success_delay);
            tracing::debug!("backend worker ready");

            while let Ok(cmd) = cmd_rx.recv() {
                let name = cmd.name();
                match cmd {
                    FormCommand::Shutdown => break,
                    FormCommand::Mount { business_id } => controller.mount(business_id).await,
                    FormCommand::Edit { field, value } => controller.edit(field, value).await,
                    FormCommand::Save => controller.save().await,
                    FormCommand::TestConnection => controller.test_connection().await,
                    FormCommand::RequestDelete => controller.request_delete().await,
                    FormCommand::ConfirmDelete => controller.confirm_delete().await,
                    FormCommand::DeclineDelete => controller.decline_delete().await,
                    FormCommand::Cancel => controller.cancel().await,
                }
                tracing::debug!(command = name, phase = ?controller.state().phase(), "command settled");
                // The terminal thread blocks until it sees this event.
                if ui_tx.send(UiEvent::Settled(controller.state().clone())).is_err() {
                    break;
                }
            }

            controller.teardown();
            tracing::debug!("backend worker stopped");
        });
    })
}

fn hooks_for(ui_tx: &Sender<UiEvent>) -> FormHooks {
    let success_tx = ui_tx.clone();
    let cancel_tx = ui_tx.clone();
    let change_tx = ui_tx.clone();
    FormHooks {
        on_success: Some(Arc::new(move || {
            let _ = success_tx.try_send(UiEvent::Succeeded);
        })),
        on_cancel: Some(Arc::new(move || {
            let _ = cancel_tx.try_send(UiEvent::Cancelled);
        })),
        on_change: Some(Arc::new(move |state: &FormState| {
            let _ = change_tx.try_send(UiEvent::Rendered(state.clone()));
        })),
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
