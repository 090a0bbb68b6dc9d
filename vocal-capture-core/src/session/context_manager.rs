use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{ContextOptions, ContextState};
use crate::models::error::ContextError;
use crate::traits::audio_context::{AudioContext, ContextFactory};

struct ContextSlot<C> {
    context: Option<Arc<C>>,
    closed: bool,
}

/// Owns the single audio context of a studio session.
///
/// The context is created lazily on first use and shared as `Arc<C>` with
/// the level monitor and the capture session. Only the manager creates or
/// closes it. Resuming is a separate operation from creation because hosts
/// only allow it in response to a user gesture.
pub struct ContextManager<F: ContextFactory> {
    factory: F,
    options: ContextOptions,
    slot: Mutex<ContextSlot<F::Context>>,
}

impl<F: ContextFactory> ContextManager<F> {
    pub fn new(factory: F, options: ContextOptions) -> Self {
        Self {
            factory,
            options,
            slot: Mutex::new(ContextSlot {
                context: None,
                closed: false,
            }),
        }
    }

    /// Return the open context, constructing one if there is none.
    ///
    /// A context the host closed behind our back is replaced. After
    /// [`close`](Self::close) no new context is created.
    pub fn ensure_context(&self) -> Result<Arc<F::Context>, ContextError> {
        let mut slot = self.slot.lock();
        if slot.closed {
            return Err(ContextError::Closed);
        }
        if let Some(context) = &slot.context {
            if context.state() != ContextState::Closed {
                return Ok(Arc::clone(context));
            }
            log::warn!("Audio context was closed by the host, creating a new one");
        }

        let context = self.factory.create_context(&self.options).map_err(|e| match e {
            ContextError::InitFailed(_) => e,
            other => ContextError::InitFailed(other.to_string()),
        })?;
        let context = Arc::new(context);
        log::info!(
            "Audio context created: {} Hz, {:?} latency, state {:?}",
            context.sample_rate(),
            self.options.latency_hint,
            context.state()
        );
        slot.context = Some(Arc::clone(&context));
        Ok(context)
    }

    /// The current context, if one is open.
    pub fn current(&self) -> Option<Arc<F::Context>> {
        self.slot
            .lock()
            .context
            .as_ref()
            .filter(|c| c.state() != ContextState::Closed)
            .cloned()
    }

    /// Live lifecycle state, including suspensions initiated by the host.
    pub fn state(&self) -> ContextState {
        let slot = self.slot.lock();
        match &slot.context {
            Some(context) => context.state(),
            None if slot.closed => ContextState::Closed,
            None => ContextState::Uninitialized,
        }
    }

    /// Whether a user gesture is needed before audio can run.
    pub fn needs_user_interaction(&self) -> bool {
        matches!(self.state(), ContextState::Uninitialized | ContextState::Suspended)
    }

    /// Resume the context; must only be called from a user gesture.
    ///
    /// Returns whether the context is running afterwards. A refused resume
    /// is logged and reported as `Ok(false)`. Never creates a context: with
    /// none open, or after close, this fails with [`ContextError::Closed`].
    pub async fn resume(&self) -> Result<bool, ContextError> {
        let context = {
            let slot = self.slot.lock();
            match &slot.context {
                Some(context) if !slot.closed => Arc::clone(context),
                _ => return Err(ContextError::Closed),
            }
        };
        match context.state() {
            ContextState::Running => return Ok(true),
            ContextState::Closed => return Err(ContextError::Closed),
            ContextState::Suspended | ContextState::Uninitialized => {}
        }

        match context.resume().await {
            Ok(()) => {
                let running = context.state() == ContextState::Running;
                log::debug!("Audio context resumed (running: {})", running);
                Ok(running)
            }
            Err(ContextError::Closed) => Err(ContextError::Closed),
            Err(e) => {
                log::warn!("Failed to resume audio context: {}", e);
                Ok(false)
            }
        }
    }

    /// Close and drop the context. Idempotent.
    pub async fn close(&self) {
        let context = {
            let mut slot = self.slot.lock();
            slot.closed = true;
            slot.context.take()
        };
        let Some(context) = context else {
            return;
        };
        if context.state() == ContextState::Closed {
            return;
        }
        match context.close().await {
            Ok(()) => log::info!("Audio context closed"),
            Err(e) => log::warn!("Failed to close audio context: {}", e),
        }
    }
}
