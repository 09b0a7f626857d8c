//! Creating, listing and removing vehicle processes.

use serde_json::{Map, Value};
use tracing::info;

use crate::auth::Session;
use crate::error::{Error, Result};
use crate::navigation::{require, Screen};
use crate::storage::DocumentStore;
use crate::vehicle::{VehicleRecord, VehicleSummary, CARS};
use crate::vin;

/// Input for starting a new vehicle process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVehicle {
    /// Display name; required.
    pub vehicle_name: String,
    /// Dealer stock number.
    pub stock_number: String,
    /// Typed or scanned VIN.
    pub vin: Option<String>,
}

/// Create a vehicle record and return its checklist screen.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if the vehicle name is blank or a VIN was
/// given but is blank, or a store error if the insert fails.
pub async fn start_process(store: &dyn DocumentStore, input: NewVehicle) -> Result<Screen> {
    if input.vehicle_name.trim().is_empty() {
        return Err(Error::MissingField {
            field: "vehicle name",
        });
    }

    let mut record = VehicleRecord::new(input.vehicle_name.trim(), input.stock_number.trim());
    record.vin = input.vin.as_deref().map(vin::normalize).transpose()?;

    let car_id = store.add(CARS, record.to_document()?).await?;
    info!("Started process {} for {}", car_id, record.vehicle_name);
    Ok(Screen::CarDetail { car_id })
}

/// Every vehicle, ordered by identifier.
///
/// # Errors
///
/// Returns an error if the store listing fails or a record is malformed.
pub async fn list_vehicles(store: &dyn DocumentStore) -> Result<Vec<VehicleSummary>> {
    store
        .list(CARS)
        .await?
        .into_iter()
        .map(|doc| VehicleRecord::from_document(doc.id, doc.body).map(|r| r.summary()))
        .collect()
}

/// Erase a vehicle record. Only offered from the admin screens.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] for non-admin sessions and
/// [`Error::NotFound`] if there was nothing to remove.
pub async fn remove_vehicle(store: &dyn DocumentStore, session: &Session, car_id: &str) -> Result<()> {
    require(session.role, &Screen::AdminHome)?;

    if store.delete(CARS, car_id).await? {
        info!("{} removed vehicle {}", session.user.email, car_id);
        Ok(())
    } else {
        Err(Error::not_found(CARS, car_id))
    }
}

/// Record a typed or scanned VIN on an existing vehicle.
///
/// Returns the normalized VIN that was stored.
///
/// # Errors
///
/// Returns [`Error::MissingField`] for a blank VIN or [`Error::NotFound`]
/// if the vehicle does not exist.
pub async fn assign_vin(store: &dyn DocumentStore, car_id: &str, raw: &str) -> Result<String> {
    let vin = vin::normalize(raw)?;
    let mut fields = Map::new();
    fields.insert("vin".to_string(), Value::from(vin.as_str()));
    store.update(CARS, car_id, fields).await?;
    info!("Recorded VIN {} for {}", vin, car_id);
    Ok(vin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthUser, Role};
    use crate::storage::SqliteStore;

    fn session(role: Role) -> Session {
        Session {
            user: AuthUser {
                uid: "u1".to_string(),
                email: "a@b.example".to_string(),
            },
            role,
        }
    }

    #[tokio::test]
    async fn test_start_process_creates_record() {
        let store = SqliteStore::open_in_memory().unwrap();
        let screen = start_process(
            &store,
            NewVehicle {
                vehicle_name: " 2015 Accord ".to_string(),
                stock_number: "S-7".to_string(),
                vin: Some("1hgcm82633a004352".to_string()),
            },
        )
        .await
        .unwrap();

        let car_id = screen.car_id().unwrap().to_string();
        let body = store.get(CARS, &car_id).await.unwrap().unwrap();
        let record = VehicleRecord::from_document(&car_id, body).unwrap();
        assert_eq!(record.vehicle_name, "2015 Accord");
        assert_eq!(record.stock_number, "S-7");
        assert_eq!(record.vin.as_deref(), Some("1HGCM82633A004352"));
        assert!(record.steps.is_none());
    }

    #[tokio::test]
    async fn test_start_process_requires_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = start_process(&store, NewVehicle::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
        assert!(store.list(CARS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_vehicles() {
        let store = SqliteStore::open_in_memory().unwrap();
        for name in ["Civic", "Accord"] {
            start_process(
                &store,
                NewVehicle {
                    vehicle_name: name.to_string(),
                    ..NewVehicle::default()
                },
            )
            .await
            .unwrap();
        }

        let vehicles = list_vehicles(&store).await.unwrap();
        assert_eq!(vehicles.len(), 2);
        assert!(vehicles.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_remove_requires_admin() {
        let store = SqliteStore::open_in_memory().unwrap();
        let screen = start_process(
            &store,
            NewVehicle {
                vehicle_name: "Civic".to_string(),
                ..NewVehicle::default()
            },
        )
        .await
        .unwrap();
        let car_id = screen.car_id().unwrap();

        let err = remove_vehicle(&store, &session(Role::User), car_id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
        assert!(store.get(CARS, car_id).await.unwrap().is_some());

        remove_vehicle(&store, &session(Role::Admin), car_id)
            .await
            .unwrap();
        assert!(store.get(CARS, car_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assign_vin() {
        let store = SqliteStore::open_in_memory().unwrap();
        let screen = start_process(
            &store,
            NewVehicle {
                vehicle_name: "Civic".to_string(),
                ..NewVehicle::default()
            },
        )
        .await
        .unwrap();
        let car_id = screen.car_id().unwrap();

        let vin = assign_vin(&store, car_id, " 1hgcm8 2633a004352 ").await.unwrap();
        assert_eq!(vin, "1HGCM82633A004352");
        let body = store.get(CARS, car_id).await.unwrap().unwrap();
        assert_eq!(body["vin"], "1HGCM82633A004352");
        assert_eq!(body["vehicleName"], "Civic");

        let err = assign_vin(&store, "ghost", "ABC").await.unwrap_err();
        assert!(err.is_not_found());
        let err = assign_vin(&store, car_id, "   ").await.unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[tokio::test]
    async fn test_remove_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = remove_vehicle(&store, &session(Role::Superuser), "ghost")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
