//! Stage forms: the per-stage status fields of a vehicle.
//!
//! Each stage owns a fixed subset of the flat vehicle fields. A form loads
//! those fields, lets them be edited, and saves them with a partial update
//! that leaves every other field of the record alone.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::navigation::Screen;
use crate::storage::DocumentStore;
use crate::vehicle::{VehicleField, VehicleRecord, CARS};

/// A workflow stage with its own status form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Intake paperwork and listing.
    InputVehicle,
    /// Mechanical inspection.
    VehicleInspection,
    /// Body repair and detailing.
    BodyShop,
    /// Lot placement.
    CarLot,
}

impl Stage {
    /// Every stage, in workflow order.
    pub const ALL: [Self; 4] = [
        Self::InputVehicle,
        Self::VehicleInspection,
        Self::BodyShop,
        Self::CarLot,
    ];

    /// The fields this stage's form edits.
    #[must_use]
    pub fn fields(self) -> &'static [VehicleField] {
        match self {
            Self::InputVehicle => &[
                VehicleField::StockNumber,
                VehicleField::DealerFolder,
                VehicleField::TitleStatus,
                VehicleField::KeyTag,
                VehicleField::Pricing,
                VehicleField::WebsiteUpload,
            ],
            Self::VehicleInspection => &[VehicleField::InspectionStatus],
            Self::BodyShop => &[VehicleField::BodyRepairStatus, VehicleField::RepairCost],
            Self::CarLot => &[VehicleField::CarLotStatus],
        }
    }

    /// Short name used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputVehicle => "input",
            Self::VehicleInspection => "inspection",
            Self::BodyShop => "body-shop",
            Self::CarLot => "car-lot",
        }
    }

    /// The screen showing this stage's form for a vehicle.
    #[must_use]
    pub fn screen(self, car_id: &str) -> Screen {
        let car_id = car_id.to_string();
        match self {
            Self::InputVehicle => Screen::InputVehicle { car_id },
            Self::VehicleInspection => Screen::VehicleInspection { car_id },
            Self::BodyShop => Screen::BodyShop { car_id },
            Self::CarLot => Screen::CarLot { car_id },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!("unknown stage '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// Editable status fields of one stage for one vehicle.
#[derive(Debug, Clone)]
pub struct StageForm {
    stage: Stage,
    car_id: String,
    values: Vec<(VehicleField, String)>,
    error: Option<String>,
}

impl StageForm {
    /// Load the stage's fields for a vehicle.
    ///
    /// Fields missing from the stored record load as empty strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the vehicle does not exist, or any
    /// store error.
    pub async fn load(store: &dyn DocumentStore, stage: Stage, car_id: &str) -> Result<Self> {
        let body = store
            .get(CARS, car_id)
            .await?
            .ok_or_else(|| Error::not_found(CARS, car_id))?;
        let record = VehicleRecord::from_document(car_id, body)?;

        Ok(Self {
            stage,
            car_id: car_id.to_string(),
            values: stage
                .fields()
                .iter()
                .map(|f| (*f, record.field(*f).to_string()))
                .collect(),
            error: None,
        })
    }

    /// The stage this form belongs to.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current field values, in form order.
    #[must_use]
    pub fn values(&self) -> &[(VehicleField, String)] {
        &self.values
    }

    /// Current value of one field, if this stage has it.
    #[must_use]
    pub fn get(&self, field: VehicleField) -> Option<&str> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    /// The inline error message from the last failed save.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set one field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldNotInStage`] if the field belongs to another stage.
    pub fn set(&mut self, field: VehicleField, value: impl Into<String>) -> Result<()> {
        let slot = self
            .values
            .iter_mut()
            .find(|(f, _)| *f == field)
            .ok_or(Error::FieldNotInStage {
                field: field.key(),
                stage: self.stage.as_str(),
            })?;
        slot.1 = value.into();
        Ok(())
    }

    /// Write this stage's fields and return the vehicle's checklist screen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteWrite`] if the store rejects the update; the
    /// message is also kept on the form.
    pub async fn save(&mut self, store: &dyn DocumentStore) -> Result<Screen> {
        let fields: Map<String, Value> = self
            .values
            .iter()
            .map(|(f, v)| (f.key().to_string(), Value::from(v.as_str())))
            .collect();

        match store.update(CARS, &self.car_id, fields).await {
            Ok(()) => {
                info!("Saved {} fields for {}", self.stage, self.car_id);
                self.error = None;
                Ok(Screen::CarDetail {
                    car_id: self.car_id.clone(),
                })
            }
            Err(err) => {
                let err = Error::remote_write(CARS, &self.car_id, err.screen_message());
                warn!("Failed to save {} for {}: {}", self.stage, self.car_id, err);
                self.error = Some(err.screen_message());
                Err(err)
            }
        }
    }
}
