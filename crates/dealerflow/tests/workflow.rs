//! End-to-end vehicle workflow against an on-disk store.

use std::path::PathBuf;
use std::sync::Arc;

use dealerflow::auth::{AuthProvider, LocalAuth};
use dealerflow::registry::{self, NewVehicle};
use dealerflow::{
    organization, CarDetail, DocumentStore, Role, Screen, Session, SessionManager, SqliteStore,
    Stage, StageForm, VehicleField,
};

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("dealerflow-it-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn manager(store: &Arc<dyn DocumentStore>, superusers: &[String]) -> SessionManager {
    let auth: Arc<dyn AuthProvider> = Arc::new(LocalAuth::new(store.clone()));
    SessionManager::new(store.clone(), auth, superusers)
}

#[tokio::test]
async fn admin_invites_employee_who_completes_a_vehicle() {
    let dir = TempDir::new();
    let store: Arc<dyn DocumentStore> =
        Arc::new(SqliteStore::open(dir.0.join("data/dealerflow.db")).unwrap());

    // Admin signs up and invites a technician.
    let mut admin = manager(&store, &[]);
    let screen = organization::sign_up_admin(&mut admin, "boss@lot.example", "pw", "Pike Auto")
        .await
        .unwrap();
    assert_eq!(screen, Screen::AdminDashboard);
    let admin_session = admin.current().unwrap().clone();
    let invitation = organization::invite(
        store.as_ref(),
        &admin_session,
        "tech@lot.example",
        Role::User,
        8,
    )
    .await
    .unwrap();

    // Technician joins and lands on the regular home screen.
    let mut tech = manager(&store, &[]);
    let screen = organization::sign_up_employee(
        &mut tech,
        "tech@lot.example",
        "pw2",
        &invitation.invite_code,
    )
    .await
    .unwrap();
    assert_eq!(screen, Screen::Home);

    // The session survives a round trip through the session file.
    let session_path = dir.0.join("session.json");
    tech.current().unwrap().save(&session_path).unwrap();
    let restored = Session::load(&session_path).unwrap().unwrap();
    assert_eq!(restored.role, Role::User);

    // Start a vehicle and work the checklist.
    let screen = registry::start_process(
        store.as_ref(),
        NewVehicle {
            vehicle_name: "2015 Honda Accord".to_string(),
            stock_number: "S-7".to_string(),
            vin: Some("1hgcm82633a004352".to_string()),
        },
    )
    .await
    .unwrap();
    let car_id = screen.car_id().unwrap().to_string();

    let mut detail = CarDetail::new(&car_id);
    detail.load(store.as_ref()).await.unwrap();
    for (step, tasks) in [(0, 6), (1, 4)] {
        for task in 0..tasks {
            assert!(detail.toggle(step, task).unwrap());
        }
    }
    detail.set_initials(0, "JD").unwrap();
    detail.set_date(0, "2024-01-01").unwrap();
    assert_eq!(detail.save(store.as_ref()).await.unwrap(), Screen::Home);

    // A stage form edits its own fields without touching the checklist.
    let mut form = StageForm::load(store.as_ref(), Stage::BodyShop, &car_id)
        .await
        .unwrap();
    form.set(VehicleField::RepairCost, "$450").unwrap();
    form.save(store.as_ref()).await.unwrap();

    let mut reloaded = CarDetail::new(&car_id);
    reloaded.load(store.as_ref()).await.unwrap();
    assert!(reloaded.steps()[0].is_complete());
    assert!(reloaded.steps()[1].is_complete());
    assert!(!reloaded.steps()[2].is_complete());
    assert_eq!(reloaded.steps()[0].initials, "JD");
    let record = reloaded.record().unwrap();
    assert_eq!(record.repair_cost, "$450");
    assert_eq!(record.vin.as_deref(), Some("1HGCM82633A004352"));

    // Only the admin can remove it.
    let err = registry::remove_vehicle(store.as_ref(), &restored, &car_id)
        .await
        .unwrap_err();
    assert!(matches!(err, dealerflow::Error::Forbidden { .. }));
    registry::remove_vehicle(store.as_ref(), &admin_session, &car_id)
        .await
        .unwrap();
    assert!(registry::list_vehicles(store.as_ref())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn superuser_email_overrides_stored_role() {
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut sessions = manager(&store, &["owner@lot.example".to_string()]);

    sessions
        .auth()
        .create_user("Owner@Lot.example", "pw")
        .await
        .unwrap();
    let screen = sessions.sign_in("owner@lot.example", "pw").await.unwrap();
    assert_eq!(screen, Screen::AdminHome);
    assert_eq!(sessions.role(), Role::Superuser);

    assert_eq!(sessions.sign_out(), Screen::Login);
    assert_eq!(sessions.role(), Role::None);
}
