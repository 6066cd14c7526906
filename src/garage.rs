//! Selectable vehicles
//!
//! Vehicles differ only in presentation; handling comes from [`crate::Tuning`].

use serde::{Deserialize, Serialize};

/// Vehicle choices offered on the selection screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VehicleKind {
    Jeep,
    Wraith,
    #[default]
    Mazda,
}

/// Presentation data for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleProfile {
    pub name: &'static str,
    /// Model asset path
    pub model: &'static str,
    /// Uniform scale applied to the model
    pub scale: f32,
    pub description: &'static str,
    /// Preview image path
    pub preview: &'static str,
}

impl VehicleKind {
    /// All vehicles in selection-screen order
    pub const ALL: [VehicleKind; 3] = [VehicleKind::Jeep, VehicleKind::Wraith, VehicleKind::Mazda];

    pub fn profile(&self) -> VehicleProfile {
        match self {
            VehicleKind::Jeep => VehicleProfile {
                name: "Jeep",
                model: "/models/jeep.glb",
                scale: 4.45,
                description: "High-performance luxury sports car",
                preview: "/jeep.jpg",
            },
            VehicleKind::Wraith => VehicleProfile {
                name: "Rolls Royce",
                model: "/models/wraith.glb",
                scale: 2.0,
                description: "Classic sports car with superior handling",
                preview: "/wraith.jpg",
            },
            VehicleKind::Mazda => VehicleProfile {
                name: "Mazda",
                model: "/models/car.glb",
                scale: 0.6,
                description: "Iconic supercar with ultimate speed",
                preview: "/subaru.avif",
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleKind::Jeep => "jeep",
            VehicleKind::Wraith => "wraith",
            VehicleKind::Mazda => "mazda",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "jeep" => Some(VehicleKind::Jeep),
            "wraith" | "rolls royce" | "rolls-royce" => Some(VehicleKind::Wraith),
            "mazda" => Some(VehicleKind::Mazda),
            _ => None,
        }
    }
}
