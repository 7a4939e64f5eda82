//! Labware and pipetting locations on the robot deck.
//!
//! The planner only needs enough bookkeeping to answer "does this source have
//! a valid location" and "is there a destination well left"; robot
//! communication itself is out of scope.

use serde::{Deserialize, Serialize};

/// A named rack, trough, or plate on the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labware {
    /// Rack label as it appears in worklists ("Water", "SourcePlate").
    pub label: String,
    /// Rack type string understood by the liquid handler ("Trough 100ml").
    pub kind: String,
}

impl Labware {
    /// Creates a labware entry.
    pub fn new(label: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: kind.into(),
        }
    }
}

/// A concrete pipetting position within a labware item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipettingLocation {
    /// Rack label of the containing labware.
    pub rack_label: String,
    /// Rack type of the containing labware.
    pub rack_type: String,
    /// 1-based position within the rack.
    pub position: u32,
}

impl PipettingLocation {
    /// Creates a pipetting location.
    pub fn new(rack_label: impl Into<String>, rack_type: impl Into<String>, position: u32) -> Self {
        Self {
            rack_label: rack_label.into(),
            rack_type: rack_type.into(),
            position,
        }
    }
}

/// A destination plate with a fixed well capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationPlate {
    /// Underlying labware entry.
    pub labware: Labware,
    /// Number of usable wells.
    pub capacity: u32,
}

impl DestinationPlate {
    /// Creates a destination plate. ITC plates on the Auto iTC-200 deck hold
    /// 96 wells.
    pub fn new(labware: Labware, capacity: u32) -> Self {
        Self { labware, capacity }
    }
}
