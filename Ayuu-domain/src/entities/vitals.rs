use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use crate::entities::risk::RiskLevel;

/// Message shown when a vitals form is saved without the mandatory fields
pub const MISSING_VITALS_MESSAGE: &str = "Please fill in Blood Pressure, Pulse Rate, and Temperature";

/// Unit a temperature was entered in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Degrees Celsius
    Celsius,
    /// Degrees Fahrenheit, the unit of the intake form
    #[default]
    Fahrenheit,
}

/// A temperature tagged with its unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Temperature {
    pub value: f64,
    pub unit: TemperatureUnit,
}

impl Temperature {
    pub fn celsius(value: f64) -> Self {
        Self { value, unit: TemperatureUnit::Celsius }
    }

    pub fn fahrenheit(value: f64) -> Self {
        Self { value, unit: TemperatureUnit::Fahrenheit }
    }

    /// The value in degrees Celsius
    pub fn as_celsius(&self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => self.value,
            TemperatureUnit::Fahrenheit => (self.value - 32.0) * 5.0 / 9.0,
        }
    }
}

/// A complete set of vital signs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalReading {
    /// Systolic blood pressure in mmHg
    pub systolic: f64,
    /// Diastolic blood pressure in mmHg
    pub diastolic: f64,
    /// Pulse in beats per minute
    pub pulse: f64,
    pub temperature: Temperature,
    /// Oxygen saturation in percent
    pub spo2: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

/// Vitals as submitted from the intake form. Every measurement may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalsEntry {
    #[validate(range(min = 40.0, max = 300.0, message = "Systolic must be between 40 and 300"))]
    pub systolic: Option<f64>,

    #[validate(range(min = 20.0, max = 200.0, message = "Diastolic must be between 20 and 200"))]
    pub diastolic: Option<f64>,

    #[validate(range(min = 20.0, max = 250.0, message = "Pulse must be between 20 and 250"))]
    pub pulse: Option<f64>,

    /// Temperature value in `temperature_unit`
    pub temperature: Option<f64>,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    #[validate(range(min = 0.0, max = 100.0, message = "SpO2 must be between 0 and 100"))]
    pub spo2: Option<f64>,

    #[validate(range(min = 30.0, max = 250.0, message = "Height must be between 30 and 250 cm"))]
    pub height_cm: Option<f64>,

    #[validate(range(min = 1.0, max = 400.0, message = "Weight must be between 1 and 400 kg"))]
    pub weight_kg: Option<f64>,

    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,

    /// Patient age in years; derived from the patient record when absent
    pub patient_age: Option<i32>,
}

impl VitalsEntry {
    /// Turn the form into a reading, failing with the user-facing message when
    /// blood pressure, pulse or temperature is missing.
    pub fn to_reading(&self) -> Result<VitalReading, &'static str> {
        match (self.systolic, self.diastolic, self.pulse, self.temperature) {
            (Some(systolic), Some(diastolic), Some(pulse), Some(temperature)) => Ok(VitalReading {
                systolic,
                diastolic,
                pulse,
                temperature: Temperature { value: temperature, unit: self.temperature_unit },
                spo2: self.spo2,
                height_cm: self.height_cm,
                weight_kg: self.weight_kg,
                notes: self.notes.clone(),
            }),
            _ => Err(MISSING_VITALS_MESSAGE),
        }
    }
}

/// Critical bounds of a vital sign; reaching either bound is critical
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CriticalBounds {
    pub low: f64,
    pub high: f64,
}

/// Reference range of one vital sign
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
    pub critical: Option<CriticalBounds>,
}

/// Reference ranges for every classified vital sign. Temperature is in °C.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalRanges {
    pub systolic: VitalRange,
    pub diastolic: VitalRange,
    pub pulse: VitalRange,
    pub temperature: VitalRange,
    pub spo2: VitalRange,
}

/// Age band selecting the reference ranges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AgeBand {
    /// Under 18
    Pediatric,
    /// 18 to 64
    Adult,
    /// 65 and over
    Elder,
}

/// Classification of a single measurement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum VitalStatus {
    Normal,
    Abnormal,
    Critical,
}

/// Per-metric classification of a reading against its age band
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalsClassification {
    pub age_band: AgeBand,
    pub systolic: VitalStatus,
    pub diastolic: VitalStatus,
    pub pulse: VitalStatus,
    pub temperature: VitalStatus,
    pub spo2: Option<VitalStatus>,
    pub bmi: Option<f64>,
    pub bmi_category: Option<String>,
}

/// Vitals attached to an appointment after a successful entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalsRecord {
    pub systolic: f64,
    pub diastolic: f64,
    pub pulse: f64,
    /// Always Celsius, rounded to one decimal
    pub temperature_c: f64,
    pub spo2: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub notes: Option<String>,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    /// Username of the staff member who took the vitals
    pub taken_by: String,
    pub taken_at: DateTime<Utc>,
}
