use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::AcceleratorConfig;
use crate::error::AccelError;
use crate::module::{AcceleratorModule, NativeModule};

/// Produces an accelerator module; may block, and is run off the caller's
/// thread under a timeout
pub trait ModuleLoader: Send + Sync + 'static {
    fn load(&self) -> Result<Arc<dyn AcceleratorModule>, AccelError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl ModuleLoader for NativeLoader {
    fn load(&self) -> Result<Arc<dyn AcceleratorModule>, AccelError> {
        Ok(Arc::new(NativeModule::new()))
    }
}

enum SlotState {
    Unloaded,
    Ready(Arc<dyn AcceleratorModule>),
    Failed { at: Instant, error: AccelError },
}

/// Lazily loaded accelerator. A failed load is remembered for the retry
/// cooldown; callers during the cooldown get `CoolingDown` without a new
/// attempt.
pub struct AcceleratorSlot {
    loader: Arc<dyn ModuleLoader>,
    config: AcceleratorConfig,
    state: Mutex<SlotState>,
}

impl AcceleratorSlot {
    pub fn new(loader: Arc<dyn ModuleLoader>, config: AcceleratorConfig) -> Self {
        Self {
            loader,
            config,
            state: Mutex::new(SlotState::Unloaded),
        }
    }

    pub fn config(&self) -> &AcceleratorConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()),
            SlotState::Ready(_)
        )
    }

    /// Last load failure, if the slot is in its cooldown window or waiting
    /// for a retry
    pub fn last_error(&self) -> Option<AccelError> {
        match &*self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) {
            SlotState::Failed { error, .. } => Some(error.clone()),
            _ => None,
        }
    }

    pub fn module(&self) -> Result<Arc<dyn AcceleratorModule>, AccelError> {
        if !self.config.enabled {
            return Err(AccelError::Disabled);
        }

        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &*state {
            SlotState::Ready(module) => return Ok(module.clone()),
            SlotState::Failed { at, .. } => {
                let elapsed = at.elapsed();
                let cooldown = self.config.retry_cooldown();
                if elapsed < cooldown {
                    return Err(AccelError::CoolingDown {
                        remaining_ms: (cooldown - elapsed).as_millis() as u64,
                    });
                }
            }
            SlotState::Unloaded => {}
        }

        match self.load_with_timeout() {
            Ok(module) => {
                tracing::debug!(module = module.name(), "accelerator loaded");
                *state = SlotState::Ready(module.clone());
                Ok(module)
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    retry_in_ms = self.config.retry_cooldown_ms,
                    "accelerator unavailable; using reference scans"
                );
                *state = SlotState::Failed {
                    at: Instant::now(),
                    error: error.clone(),
                };
                Err(error)
            }
        }
    }

    fn load_with_timeout(&self) -> Result<Arc<dyn AcceleratorModule>, AccelError> {
        let (tx, rx) = mpsc::channel();
        let loader = self.loader.clone();
        std::thread::Builder::new()
            .name("snippet-accel-load".to_string())
            .spawn(move || {
                let _ = tx.send(loader.load());
            })
            .map_err(|err| AccelError::Load(err.to_string()))?;

        match rx.recv_timeout(self.config.load_timeout()) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(AccelError::LoadTimeout {
                timeout_ms: self.config.load_timeout_ms,
            }),
            Err(RecvTimeoutError::Disconnected) => {
                Err(AccelError::Load("loader exited without a result".to_string()))
            }
        }
    }
}

impl std::fmt::Debug for AcceleratorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceleratorSlot")
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
