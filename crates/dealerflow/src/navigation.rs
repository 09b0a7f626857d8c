//! Named screens and role-based screen selection.
//!
//! Routing is a value: operations that finish by moving somewhere return a
//! [`Screen`], and the caller decides how to show it. Role checks here are
//! screen selection only; storage does not enforce them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::error::{Error, Result};

/// A navigable screen and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// Sign-in form.
    Login,
    /// Home screen for regular users; also the post-save summary view.
    Home,
    /// Home screen for admins and the superuser.
    AdminHome,
    /// Organization management (invitations).
    AdminDashboard,
    /// Start a new vehicle process.
    NewCarProcess,
    /// Scan a VIN barcode.
    BarcodeScanner,
    /// Vehicle listing with removal.
    FindCar,
    /// Checklist for one vehicle.
    CarDetail {
        /// Vehicle identifier.
        car_id: String,
    },
    /// Intake fields for one vehicle.
    InputVehicle {
        /// Vehicle identifier.
        car_id: String,
    },
    /// Inspection status for one vehicle.
    VehicleInspection {
        /// Vehicle identifier.
        car_id: String,
    },
    /// Body shop status for one vehicle.
    BodyShop {
        /// Vehicle identifier.
        car_id: String,
    },
    /// Car lot status for one vehicle.
    CarLot {
        /// Vehicle identifier.
        car_id: String,
    },
}

impl Screen {
    /// The route name of this screen.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Home => "Home",
            Self::AdminHome => "AdminHome",
            Self::AdminDashboard => "AdminDashboard",
            Self::NewCarProcess => "NewCarProcess",
            Self::BarcodeScanner => "BarcodeScanner",
            Self::FindCar => "FindCar",
            Self::CarDetail { .. } => "CarDetail",
            Self::InputVehicle { .. } => "InputVehicle",
            Self::VehicleInspection { .. } => "VehicleInspection",
            Self::BodyShop { .. } => "BodyShop",
            Self::CarLot { .. } => "CarLot",
        }
    }

    /// The vehicle this screen is about, if any.
    #[must_use]
    pub fn car_id(&self) -> Option<&str> {
        match self {
            Self::CarDetail { car_id }
            | Self::InputVehicle { car_id }
            | Self::VehicleInspection { car_id }
            | Self::BodyShop { car_id }
            | Self::CarLot { car_id } => Some(car_id),
            _ => None,
        }
    }

    /// Check whether a role may open this screen.
    #[must_use]
    pub fn allows(&self, role: Role) -> bool {
        match self {
            Self::Login => true,
            Self::AdminHome | Self::AdminDashboard => role.is_admin(),
            _ => role.is_signed_in(),
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.car_id() {
            Some(id) => write!(f, "{}({id})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// The first screen shown for a role.
#[must_use]
pub fn initial_screen(role: Role) -> Screen {
    match role {
        Role::Superuser | Role::Admin => Screen::AdminHome,
        Role::User => Screen::Home,
        Role::None => Screen::Login,
    }
}

/// Check that a role may open a screen.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] if the role may not open the screen.
pub fn require(role: Role, screen: &Screen) -> Result<()> {
    if screen.allows(role) {
        Ok(())
    } else {
        Err(Error::Forbidden {
            role: role.to_string(),
            screen: screen.name().to_string(),
        })
    }
}
