//! The per-vehicle checklist screen: load, merge, toggle, save.
//!
//! A [`CarDetail`] holds its own copy of one vehicle record. Loading fetches
//! the record and takes its stored steps (validated against the template)
//! or falls back to a blank template. Edits stay in memory until
//! [`CarDetail::save`] writes the whole record back.
//!
//! ```text
//! Loading ──load──▶ Ready ──save──▶ Saving ──▶ Ready (+ navigate Home)
//!    │                                   └───▶ Ready (+ error message)
//!    └──────────▶ LoadError
//! ```

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::checklist::{self, Step};
use crate::error::{Error, Result};
use crate::navigation::Screen;
use crate::storage::DocumentStore;
use crate::vehicle::{VehicleRecord, CARS};

/// Where a checklist screen is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    /// Waiting for the record to arrive.
    Loading,
    /// Record loaded; edits allowed.
    Ready,
    /// The record could not be loaded. Terminal for this screen.
    LoadError,
    /// A save is in flight.
    Saving,
}

impl ProcessState {
    fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::LoadError => "showing a load error",
            Self::Saving => "saving",
        }
    }
}

/// Checklist screen state for one vehicle.
#[derive(Debug, Clone)]
pub struct CarDetail {
    car_id: String,
    state: ProcessState,
    record: Option<VehicleRecord>,
    steps: Vec<Step>,
    error: Option<String>,
}

impl CarDetail {
    /// A screen for the given vehicle, not yet loaded.
    #[must_use]
    pub fn new(car_id: impl Into<String>) -> Self {
        Self {
            car_id: car_id.into(),
            state: ProcessState::Loading,
            record: None,
            steps: checklist::template(),
            error: None,
        }
    }

    /// The vehicle identifier.
    #[must_use]
    pub fn car_id(&self) -> &str {
        &self.car_id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    /// The loaded record, without the in-memory checklist edits.
    #[must_use]
    pub fn record(&self) -> Option<&VehicleRecord> {
        self.record.as_ref()
    }

    /// The in-memory checklist.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The inline error message, if the last load or save failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch the record and merge its checklist.
    ///
    /// On failure the screen moves to [`ProcessState::LoadError`] and keeps
    /// the message for display.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the vehicle does not exist,
    /// [`Error::StructuralMismatch`] if its stored steps do not fit the
    /// template, or any store error.
    pub async fn load(&mut self, store: &dyn DocumentStore) -> Result<()> {
        if self.state != ProcessState::Loading {
            return Err(Error::InvalidState {
                action: "load",
                state: self.state.name(),
            });
        }

        match self.fetch(store).await {
            Ok((record, steps)) => {
                debug!(
                    "Loaded {} with {} checked tasks",
                    self.car_id,
                    steps.iter().map(Step::checked_count).sum::<usize>()
                );
                self.record = Some(record);
                self.steps = steps;
                self.state = ProcessState::Ready;
                Ok(())
            }
            Err(err) => {
                warn!("Failed to load {}: {}", self.car_id, err);
                self.error = Some(err.screen_message());
                self.state = ProcessState::LoadError;
                Err(err)
            }
        }
    }

    async fn fetch(&self, store: &dyn DocumentStore) -> Result<(VehicleRecord, Vec<Step>)> {
        let body = store
            .get(CARS, &self.car_id)
            .await?
            .ok_or_else(|| Error::not_found(CARS, &self.car_id))?;
        let record = VehicleRecord::from_document(&self.car_id, body)?;

        let steps = match &record.steps {
            Some(stored) => {
                checklist::validate(stored)?;
                stored.clone()
            }
            None => checklist::template(),
        };
        Ok((record, steps))
    }

    fn require_ready(&self, action: &'static str) -> Result<()> {
        if self.state == ProcessState::Ready {
            Ok(())
        } else {
            Err(Error::InvalidState {
                action,
                state: self.state.name(),
            })
        }
    }

    fn step_mut(&mut self, step: usize) -> Result<&mut Step> {
        self.steps.get_mut(step).ok_or(Error::InvalidStep { step })
    }

    /// One step of the checklist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStep`] if the index is out of range.
    pub fn step(&self, step: usize) -> Result<&Step> {
        self.steps.get(step).ok_or(Error::InvalidStep { step })
    }

    /// Flip one task's checked flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStep`] or [`Error::InvalidPosition`] if an
    /// index is out of range, leaving the checklist unchanged.
    pub fn toggle(&mut self, step: usize, task: usize) -> Result<bool> {
        self.require_ready("toggle a task")?;
        let slot = self
            .step_mut(step)?
            .tasks
            .get_mut(task)
            .ok_or(Error::InvalidPosition { step, task })?;
        slot.checked = !slot.checked;
        Ok(slot.checked)
    }

    /// Replace the initials on one step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStep`] if the step index is out of range.
    pub fn set_initials(&mut self, step: usize, initials: impl Into<String>) -> Result<()> {
        self.require_ready("edit initials")?;
        self.step_mut(step)?.initials = initials.into();
        Ok(())
    }

    /// Replace the date on one step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStep`] if the step index is out of range.
    pub fn set_date(&mut self, step: usize, date: impl Into<String>) -> Result<()> {
        self.require_ready("edit the date")?;
        self.step_mut(step)?.date = date.into();
        Ok(())
    }

    /// The record as it would be written by [`CarDetail::save`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if nothing has been loaded.
    pub fn merged(&self) -> Result<VehicleRecord> {
        let record = self.record.as_ref().ok_or(Error::InvalidState {
            action: "merge the checklist",
            state: self.state.name(),
        })?;
        let mut merged = record.clone();
        merged.steps = Some(self.steps.clone());
        Ok(merged)
    }

    /// Write the whole record, flat fields and checklist, back to the store.
    ///
    /// Returns the summary screen to navigate to. On failure the screen
    /// stays ready with the message kept for display; in-memory edits are
    /// not rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteWrite`] if the store rejects the write, or
    /// [`Error::InvalidState`] if the screen is not ready.
    pub async fn save(&mut self, store: &dyn DocumentStore) -> Result<Screen> {
        self.require_ready("save")?;
        self.state = ProcessState::Saving;
        self.error = None;

        let result = self.write(store).await;
        self.state = ProcessState::Ready;

        match result {
            Ok(()) => {
                info!("Saved checklist for {}", self.car_id);
                if let Some(record) = self.record.as_mut() {
                    record.steps = Some(self.steps.clone());
                }
                Ok(Screen::Home)
            }
            Err(err) => {
                let err = match err {
                    Error::RemoteWrite { .. } | Error::InvalidState { .. } => err,
                    other => Error::remote_write(CARS, &self.car_id, other.screen_message()),
                };
                warn!("Failed to save {}: {}", self.car_id, err);
                self.error = Some(err.screen_message());
                Err(err)
            }
        }
    }

    async fn write(&self, store: &dyn DocumentStore) -> Result<()> {
        let body = self.merged()?.to_document()?;
        let Value::Object(fields) = body else {
            return Err(Error::internal("vehicle record did not serialize to an object"));
        };
        store.update(CARS, &self.car_id, fields).await
    }
}
