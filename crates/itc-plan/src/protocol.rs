//! Instrument protocol descriptors.

use serde::{Deserialize, Serialize};

/// Named bundle of instrument method files used for one titration.
///
/// Protocols are plain data: the sample-prep, injection-method, and analysis
/// method names are passed through to the instrument spreadsheet untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItcProtocol {
    /// Display name of the protocol.
    pub name: String,
    /// Sample preparation method file.
    pub sample_prep_method: String,
    /// Injection method file (.inj).
    pub itc_method: String,
    /// Analysis method applied by the instrument software.
    pub analysis_method: String,
}

impl ItcProtocol {
    /// Creates a protocol descriptor.
    pub fn new(
        name: impl Into<String>,
        sample_prep_method: impl Into<String>,
        itc_method: impl Into<String>,
        analysis_method: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            sample_prep_method: sample_prep_method.into(),
            itc_method: itc_method.into(),
            analysis_method: analysis_method.into(),
        }
    }

    /// Protocol used for water/buffer control titrations.
    pub fn control() -> Self {
        Self::new(
            "control protocol",
            "Plates Quick.setup",
            "ChoderaWaterWater.inj",
            "Control",
        )
    }

    /// Protocol for 1:1 binding titrations.
    pub fn binding() -> Self {
        Self::new(
            "1:1 binding protocol",
            "Plates Quick.setup",
            "ChoderaHostGuest.inj",
            "Onesite",
        )
    }

    /// Binding protocol variant that keeps the cell loaded between runs,
    /// used for buffer-into-guest blanks.
    pub fn blank() -> Self {
        Self::new(
            "1:1 binding protocol",
            "Chodera Load Cell Without Cleaning Cell After.setup",
            "ChoderaHostGuest.inj",
            "Onesite",
        )
    }

    /// Cell cleaning protocol.
    pub fn cleaning() -> Self {
        Self::new(
            "cleaning protocol",
            "Plates Clean.setup",
            "water5inj.inj",
            "Control",
        )
    }
}
