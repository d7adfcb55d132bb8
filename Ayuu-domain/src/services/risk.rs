//! Cardiovascular risk heuristic.
//!
//! A weighted sum over fixed rule bands, not a trained model. Within each
//! metric the bands are checked from the most severe down and only the first
//! match contributes.

use crate::entities::risk::{CardiovascularRiskAssessment, RiskFactors, RiskInput, RiskLevel};
use crate::entities::vitals::VitalReading;

/// SpO2 assumed when the reading has none
pub const DEFAULT_SPO2: f64 = 98.0;

const NORMAL: &str = "Normal";

fn blood_pressure_rule(systolic: f64, diastolic: f64) -> (u32, &'static str) {
    if systolic >= 180.0 || diastolic >= 120.0 {
        (40, "Hypertensive Crisis")
    } else if systolic >= 160.0 || diastolic >= 100.0 {
        (30, "Stage 2 Hypertension")
    } else if systolic >= 140.0 || diastolic >= 90.0 {
        (20, "Stage 1 Hypertension")
    } else if systolic >= 130.0 || diastolic >= 80.0 {
        (10, "Elevated")
    } else if systolic < 90.0 || diastolic < 60.0 {
        (15, "Hypotension")
    } else {
        (0, NORMAL)
    }
}

fn heart_rate_rule(pulse: f64) -> (u32, &'static str) {
    if pulse > 120.0 {
        (25, "Severe Tachycardia")
    } else if pulse > 100.0 {
        (15, "Tachycardia")
    } else if pulse < 50.0 {
        (20, "Bradycardia")
    } else if pulse < 60.0 {
        (10, "Mild Bradycardia")
    } else {
        (0, NORMAL)
    }
}

fn temperature_rule(temperature: f64) -> (u32, &'static str) {
    // Values above 50 can only be Fahrenheit
    let temp_c = if temperature > 50.0 {
        (temperature - 32.0) * 5.0 / 9.0
    } else {
        temperature
    };

    if temp_c >= 39.0 {
        (15, "High Fever")
    } else if temp_c >= 38.0 {
        (10, "Moderate Fever")
    } else if temp_c < 36.0 {
        (12, "Hypothermia")
    } else {
        (0, NORMAL)
    }
}

fn spo2_rule(spo2: f64) -> (u32, &'static str) {
    if spo2 < 90.0 {
        (15, "Severe Hypoxemia")
    } else if spo2 < 95.0 {
        (10, "Mild Hypoxemia")
    } else {
        (0, NORMAL)
    }
}

fn age_rule(age: i32) -> (u32, &'static str) {
    if age >= 75 {
        (5, "High Risk Age")
    } else if age >= 65 {
        (3, "Moderate Risk Age")
    } else {
        (0, NORMAL)
    }
}

fn bmi_rule(bmi: f64) -> Option<(u32, &'static str)> {
    if bmi >= 35.0 {
        Some((8, "Severely Obese"))
    } else if bmi >= 30.0 {
        Some((5, "Obese"))
    } else if bmi < 18.5 {
        Some((3, "Underweight"))
    } else {
        None
    }
}

/// Level for a total score
pub fn risk_level(score: u32) -> RiskLevel {
    if score >= 60 {
        RiskLevel::Critical
    } else if score >= 40 {
        RiskLevel::High
    } else if score >= 20 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

fn guidance(level: RiskLevel) -> (&'static str, [&'static str; 5]) {
    match level {
        RiskLevel::Critical => (
            "Critical cardiovascular risk detected. Immediate medical intervention required.",
            [
                "Immediate physician evaluation required",
                "Consider emergency department referral",
                "Continuous cardiac monitoring",
                "IV access and emergency medications ready",
                "Frequent vital sign monitoring (every 15 minutes)",
            ],
        ),
        RiskLevel::High => (
            "High cardiovascular risk. Close monitoring and intervention needed.",
            [
                "Urgent physician consultation within 1 hour",
                "Cardiac monitoring recommended",
                "Repeat vitals every 30 minutes",
                "Consider ECG and cardiac enzymes",
                "Prepare for potential interventions",
            ],
        ),
        RiskLevel::Moderate => (
            "Moderate cardiovascular risk. Enhanced monitoring recommended.",
            [
                "Physician evaluation within 2-4 hours",
                "Monitor vitals every hour",
                "Consider basic cardiac workup",
                "Patient education on warning signs",
                "Follow-up appointment scheduled",
            ],
        ),
        RiskLevel::Low => (
            "Low cardiovascular risk. Routine monitoring appropriate.",
            [
                "Standard monitoring protocols",
                "Routine physician evaluation",
                "Patient education on healthy lifestyle",
                "Regular follow-up as scheduled",
                "Continue current treatment plan",
            ],
        ),
    }
}

/// Score the cardiovascular risk of a set of vitals. Never fails.
pub fn calculate_cardiovascular_risk(input: &RiskInput) -> CardiovascularRiskAssessment {
    let (bp_points, blood_pressure) = blood_pressure_rule(input.systolic, input.diastolic);
    let (hr_points, heart_rate) = heart_rate_rule(input.pulse);
    let (temp_points, temperature) = temperature_rule(input.temperature);
    let (spo2_points, oxygen_saturation) = spo2_rule(input.spo2);
    let (age_points, age) = age_rule(input.age);

    // Zero counts as no BMI
    let bmi = input.bmi.filter(|b| *b != 0.0).and_then(bmi_rule);

    let score = bp_points
        + hr_points
        + temp_points
        + spo2_points
        + age_points
        + bmi.map(|(points, _)| points).unwrap_or(0);

    let level = risk_level(score);
    let (message, recommendations) = guidance(level);

    CardiovascularRiskAssessment {
        score,
        level,
        message: message.to_string(),
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
        factors: RiskFactors {
            blood_pressure: blood_pressure.to_string(),
            heart_rate: heart_rate.to_string(),
            temperature: temperature.to_string(),
            oxygen_saturation: oxygen_saturation.to_string(),
            age: age.to_string(),
            bmi: bmi.map(|(_, label)| label.to_string()),
        },
    }
}

impl RiskInput {
    /// Build the heuristic's input from a unit-tagged reading.
    ///
    /// Temperature is passed in Celsius so the Fahrenheit guess never applies.
    pub fn from_reading(reading: &VitalReading, age: i32, bmi: Option<f64>) -> Self {
        Self {
            systolic: reading.systolic,
            diastolic: reading.diastolic,
            pulse: reading.pulse,
            temperature: reading.temperature.as_celsius(),
            spo2: reading.spo2.unwrap_or(DEFAULT_SPO2),
            age,
            bmi,
        }
    }
}
