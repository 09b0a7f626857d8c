//! Vehicle records as stored in the `cars` collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checklist::Step;
use crate::error::Result;

/// Name of the collection holding vehicle records.
pub const CARS: &str = "cars";

/// The persisted document for one vehicle.
///
/// Flat status fields are free text; a field missing from the stored
/// document reads as an empty string. Unknown keys are carried through
/// untouched so that a wholesale write never drops data it did not read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleRecord {
    /// Document identifier (the storage key, not part of the body).
    #[serde(skip)]
    pub id: String,
    /// Display name of the vehicle.
    pub vehicle_name: String,
    /// Dealer stock number.
    pub stock_number: String,
    /// Normalized VIN, when one was entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    /// Dealer jacket folder.
    pub dealer_folder: String,
    /// Title status.
    pub title_status: String,
    /// Key tag.
    pub key_tag: String,
    /// Pricing.
    pub pricing: String,
    /// Website upload status.
    pub website_upload: String,
    /// Body repair status.
    pub body_repair_status: String,
    /// Body repair cost.
    pub repair_cost: String,
    /// Mechanical inspection status.
    pub inspection_status: String,
    /// Car lot placement status.
    pub car_lot_status: String,
    /// Checklist progress; absent until the checklist is first saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Step>>,
    /// Stored keys this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VehicleRecord {
    /// Start a record for a new vehicle process.
    #[must_use]
    pub fn new(vehicle_name: impl Into<String>, stock_number: impl Into<String>) -> Self {
        Self {
            vehicle_name: vehicle_name.into(),
            stock_number: stock_number.into(),
            ..Self::default()
        }
    }

    /// Build a record from a stored document body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not an object of the expected shape.
    pub fn from_document(id: impl Into<String>, body: Value) -> Result<Self> {
        let mut record: Self = serde_json::from_value(body)?;
        record.id = id.into();
        Ok(record)
    }

    /// Serialize the record body for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Read a flat status field.
    #[must_use]
    pub fn field(&self, field: VehicleField) -> &str {
        match field {
            VehicleField::VehicleName => &self.vehicle_name,
            VehicleField::StockNumber => &self.stock_number,
            VehicleField::DealerFolder => &self.dealer_folder,
            VehicleField::TitleStatus => &self.title_status,
            VehicleField::KeyTag => &self.key_tag,
            VehicleField::Pricing => &self.pricing,
            VehicleField::WebsiteUpload => &self.website_upload,
            VehicleField::BodyRepairStatus => &self.body_repair_status,
            VehicleField::RepairCost => &self.repair_cost,
            VehicleField::InspectionStatus => &self.inspection_status,
            VehicleField::CarLotStatus => &self.car_lot_status,
        }
    }

    /// Overwrite a flat status field.
    pub fn set_field(&mut self, field: VehicleField, value: impl Into<String>) {
        let slot = match field {
            VehicleField::VehicleName => &mut self.vehicle_name,
            VehicleField::StockNumber => &mut self.stock_number,
            VehicleField::DealerFolder => &mut self.dealer_folder,
            VehicleField::TitleStatus => &mut self.title_status,
            VehicleField::KeyTag => &mut self.key_tag,
            VehicleField::Pricing => &mut self.pricing,
            VehicleField::WebsiteUpload => &mut self.website_upload,
            VehicleField::BodyRepairStatus => &mut self.body_repair_status,
            VehicleField::RepairCost => &mut self.repair_cost,
            VehicleField::InspectionStatus => &mut self.inspection_status,
            VehicleField::CarLotStatus => &mut self.car_lot_status,
        };
        *slot = value.into();
    }

    /// Short listing entry for this vehicle.
    #[must_use]
    pub fn summary(&self) -> VehicleSummary {
        VehicleSummary {
            id: self.id.clone(),
            vehicle_name: self.vehicle_name.clone(),
            stock_number: self.stock_number.clone(),
        }
    }
}

/// A flat, free-text field on a vehicle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleField {
    /// Display name of the vehicle.
    VehicleName,
    /// Dealer stock number.
    StockNumber,
    /// Dealer jacket folder.
    DealerFolder,
    /// Title status.
    TitleStatus,
    /// Key tag.
    KeyTag,
    /// Pricing.
    Pricing,
    /// Website upload status.
    WebsiteUpload,
    /// Body repair status.
    BodyRepairStatus,
    /// Body repair cost.
    RepairCost,
    /// Mechanical inspection status.
    InspectionStatus,
    /// Car lot placement status.
    CarLotStatus,
}

impl VehicleField {
    /// Every field, in form order.
    pub const ALL: [Self; 11] = [
        Self::VehicleName,
        Self::StockNumber,
        Self::DealerFolder,
        Self::TitleStatus,
        Self::KeyTag,
        Self::Pricing,
        Self::WebsiteUpload,
        Self::BodyRepairStatus,
        Self::RepairCost,
        Self::InspectionStatus,
        Self::CarLotStatus,
    ];

    /// The document key this field is stored under.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::VehicleName => "vehicleName",
            Self::StockNumber => "stockNumber",
            Self::DealerFolder => "dealerFolder",
            Self::TitleStatus => "titleStatus",
            Self::KeyTag => "keyTag",
            Self::Pricing => "pricing",
            Self::WebsiteUpload => "websiteUpload",
            Self::BodyRepairStatus => "bodyRepairStatus",
            Self::RepairCost => "repairCost",
            Self::InspectionStatus => "inspectionStatus",
            Self::CarLotStatus => "carLotStatus",
        }
    }

    /// Human-readable label, as shown next to an input.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::VehicleName => "Vehicle Name",
            Self::StockNumber => "Stock Number",
            Self::DealerFolder => "Dealer Folder",
            Self::TitleStatus => "Title Status",
            Self::KeyTag => "Key Tag",
            Self::Pricing => "Pricing",
            Self::WebsiteUpload => "Website Upload",
            Self::BodyRepairStatus => "Body Repair Status",
            Self::RepairCost => "Repair Cost",
            Self::InspectionStatus => "Inspection Status",
            Self::CarLotStatus => "Car Lot Status",
        }
    }
}

impl std::fmt::Display for VehicleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A vehicle as shown in the find-car listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleSummary {
    /// Document identifier.
    pub id: String,
    /// Display name of the vehicle.
    pub vehicle_name: String,
    /// Dealer stock number.
    pub stock_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::template;
    use serde_json::json;

    #[test]
    fn test_missing_fields_read_empty() {
        let record =
            VehicleRecord::from_document("car1", json!({"vehicleName": "2012 Civic"})).unwrap();
        assert_eq!(record.id, "car1");
        assert_eq!(record.vehicle_name, "2012 Civic");
        assert_eq!(record.stock_number, "");
        assert_eq!(record.car_lot_status, "");
        assert!(record.steps.is_none());
        assert!(record.vin.is_none());
    }

    #[test]
    fn test_document_uses_camel_case() {
        let mut record = VehicleRecord::new("Civic", "S-100");
        record.body_repair_status = "done".to_string();
        let doc = record.to_document().unwrap();
        assert_eq!(doc["vehicleName"], "Civic");
        assert_eq!(doc["stockNumber"], "S-100");
        assert_eq!(doc["bodyRepairStatus"], "done");
        assert!(doc.get("id").is_none());
        assert!(doc.get("steps").is_none());
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let body = json!({"vehicleName": "Civic", "inputVehicle": {}, "mileage": 12});
        let record = VehicleRecord::from_document("car1", body).unwrap();
        let doc = record.to_document().unwrap();
        assert_eq!(doc["inputVehicle"], json!({}));
        assert_eq!(doc["mileage"], 12);
    }

    #[test]
    fn test_steps_carried_through() {
        let mut record = VehicleRecord::new("Civic", "S-100");
        record.steps = Some(template());
        let doc = record.to_document().unwrap();
        let back = VehicleRecord::from_document("x", doc).unwrap();
        assert_eq!(back.steps, Some(template()));
    }

    #[test]
    fn test_field_accessors() {
        let mut record = VehicleRecord::default();
        record.set_field(VehicleField::RepairCost, "$200");
        record.set_field(VehicleField::CarLotStatus, "parked");
        assert_eq!(record.field(VehicleField::RepairCost), "$200");
        assert_eq!(record.repair_cost, "$200");
        assert_eq!(record.field(VehicleField::CarLotStatus), "parked");
    }

    #[test]
    fn test_field_keys_match_serialization() {
        let doc = VehicleRecord::default().to_document().unwrap();
        for field in [
            VehicleField::VehicleName,
            VehicleField::StockNumber,
            VehicleField::DealerFolder,
            VehicleField::TitleStatus,
            VehicleField::KeyTag,
            VehicleField::Pricing,
            VehicleField::WebsiteUpload,
            VehicleField::BodyRepairStatus,
            VehicleField::RepairCost,
            VehicleField::InspectionStatus,
            VehicleField::CarLotStatus,
        ] {
            assert!(doc.get(field.key()).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert!(VehicleRecord::from_document("x", json!("nope")).is_err());
    }

    #[test]
    fn test_summary() {
        let mut record = VehicleRecord::new("Civic", "S-100");
        record.id = "abc".to_string();
        let summary = record.summary();
        assert_eq!(summary.id, "abc");
        assert_eq!(summary.vehicle_name, "Civic");
        assert_eq!(summary.stock_number, "S-100");
    }
}
