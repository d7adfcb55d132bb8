use crate::entities::vitals::{
    AgeBand, CriticalBounds, VitalRange, VitalRanges, VitalReading, VitalStatus, VitalsClassification,
};

fn range(min: f64, max: f64, unit: &str, low: f64, high: f64) -> VitalRange {
    VitalRange {
        min,
        max,
        unit: unit.to_string(),
        critical: Some(CriticalBounds { low, high }),
    }
}

/// Age band for an age in years. Negative ages fall into the pediatric band.
pub fn age_band(age: i32) -> AgeBand {
    if age < 18 {
        AgeBand::Pediatric
    } else if age >= 65 {
        AgeBand::Elder
    } else {
        AgeBand::Adult
    }
}

/// Reference ranges for the age band of `age`
pub fn get_vital_ranges(age: i32) -> VitalRanges {
    let temperature = range(36.1, 37.2, "°C", 35.0, 39.0);

    match age_band(age) {
        AgeBand::Pediatric => VitalRanges {
            systolic: range(90.0, 120.0, "mmHg", 70.0, 140.0),
            diastolic: range(60.0, 80.0, "mmHg", 40.0, 90.0),
            pulse: range(70.0, 120.0, "bpm", 50.0, 150.0),
            temperature,
            spo2: range(95.0, 100.0, "%", 90.0, 100.0),
        },
        AgeBand::Elder => VitalRanges {
            systolic: range(120.0, 140.0, "mmHg", 90.0, 180.0),
            diastolic: range(70.0, 90.0, "mmHg", 50.0, 110.0),
            pulse: range(60.0, 90.0, "bpm", 45.0, 120.0),
            temperature,
            spo2: range(95.0, 100.0, "%", 88.0, 100.0),
        },
        AgeBand::Adult => VitalRanges {
            systolic: range(90.0, 120.0, "mmHg", 80.0, 180.0),
            diastolic: range(60.0, 80.0, "mmHg", 50.0, 110.0),
            pulse: range(60.0, 100.0, "bpm", 50.0, 120.0),
            temperature,
            spo2: range(95.0, 100.0, "%", 90.0, 100.0),
        },
    }
}

/// Classify a value. Critical bounds are inclusive and win over abnormal.
pub fn get_vital_status(value: f64, range: &VitalRange) -> VitalStatus {
    if let Some(critical) = range.critical {
        if value <= critical.low || value >= critical.high {
            return VitalStatus::Critical;
        }
    }

    if value < range.min || value > range.max {
        return VitalStatus::Abnormal;
    }

    VitalStatus::Normal
}

/// Body mass index rounded to one decimal
pub fn calculate_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    (weight_kg / (height_m * height_m) * 10.0).round() / 10.0
}

/// BMI if both height and weight are positive
pub fn bmi_for(reading: &VitalReading) -> Option<f64> {
    match (reading.height_cm, reading.weight_kg) {
        (Some(h), Some(w)) if h > 0.0 && w > 0.0 => Some(calculate_bmi(h, w)),
        _ => None,
    }
}

pub fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "Underweight"
    } else if bmi < 25.0 {
        "Normal"
    } else if bmi < 30.0 {
        "Overweight"
    } else if bmi < 35.0 {
        "Obese Class I"
    } else if bmi < 40.0 {
        "Obese Class II"
    } else {
        "Obese Class III"
    }
}

/// Alert strings raised at intake, independent of the patient's age band
pub fn critical_warnings(reading: &VitalReading) -> Vec<String> {
    let mut warnings = Vec::new();

    if reading.systolic > 180.0 {
        warnings.push("CRITICAL: Systolic BP > 180 mmHg - Hypertensive Crisis!");
    }
    if reading.diastolic > 120.0 {
        warnings.push("CRITICAL: Diastolic BP > 120 mmHg - Hypertensive Crisis!");
    }
    if reading.systolic < 90.0 {
        warnings.push("CRITICAL: Systolic BP < 90 mmHg - Severe Hypotension!");
    }

    if reading.pulse > 120.0 {
        warnings.push("CRITICAL: Heart Rate > 120 bpm - Severe Tachycardia!");
    }
    if reading.pulse < 50.0 {
        warnings.push("CRITICAL: Heart Rate < 50 bpm - Severe Bradycardia!");
    }

    if matches!(reading.spo2, Some(spo2) if spo2 < 90.0) {
        warnings.push("CRITICAL: SpO2 < 90% - Severe Hypoxemia!");
    }

    let temp_c = reading.temperature.as_celsius();
    if temp_c > 39.0 {
        warnings.push("CRITICAL: Temperature > 39°C (102.2°F) - High Fever!");
    }
    if temp_c < 35.0 {
        warnings.push("CRITICAL: Temperature < 35°C (95°F) - Hypothermia!");
    }

    warnings.into_iter().map(String::from).collect()
}

/// Classify every metric of a reading against the ranges for `age`
pub fn classify_reading(reading: &VitalReading, age: i32) -> VitalsClassification {
    let ranges = get_vital_ranges(age);
    let bmi = bmi_for(reading);

    VitalsClassification {
        age_band: age_band(age),
        systolic: get_vital_status(reading.systolic, &ranges.systolic),
        diastolic: get_vital_status(reading.diastolic, &ranges.diastolic),
        pulse: get_vital_status(reading.pulse, &ranges.pulse),
        temperature: get_vital_status(reading.temperature.as_celsius(), &ranges.temperature),
        spo2: reading.spo2.map(|v| get_vital_status(v, &ranges.spo2)),
        bmi,
        bmi_category: bmi.map(|b| bmi_category(b).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::vitals::Temperature;

    fn reading(systolic: f64, diastolic: f64, pulse: f64, temp_f: f64, spo2: Option<f64>) -> VitalReading {
        VitalReading {
            systolic,
            diastolic,
            pulse,
            temperature: Temperature::fahrenheit(temp_f),
            spo2,
            height_cm: None,
            weight_kg: None,
            notes: None,
        }
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(age_band(17), AgeBand::Pediatric);
        assert_eq!(age_band(18), AgeBand::Adult);
        assert_eq!(age_band(64), AgeBand::Adult);
        assert_eq!(age_band(65), AgeBand::Elder);
        assert_eq!(age_band(-3), AgeBand::Pediatric);
        assert_eq!(age_band(140), AgeBand::Elder);
    }

    #[test]
    fn test_ranges_per_band() {
        let child = get_vital_ranges(10);
        assert_eq!(child.pulse.min, 70.0);
        assert_eq!(child.systolic.critical.unwrap().high, 140.0);

        let adult = get_vital_ranges(18);
        assert_eq!(adult.pulse.max, 100.0);
        assert_eq!(adult.systolic.critical.unwrap().low, 80.0);

        let elder = get_vital_ranges(65);
        assert_eq!(elder.systolic.min, 120.0);
        assert_eq!(elder.spo2.critical.unwrap().low, 88.0);
        assert_eq!(elder.temperature, adult.temperature);
    }

    #[test]
    fn test_critical_bounds_are_inclusive() {
        let ranges = get_vital_ranges(40);
        assert_eq!(get_vital_status(180.0, &ranges.systolic), VitalStatus::Critical);
        assert_eq!(get_vital_status(80.0, &ranges.systolic), VitalStatus::Critical);
        assert_eq!(get_vital_status(179.0, &ranges.systolic), VitalStatus::Abnormal);
        assert_eq!(get_vital_status(110.0, &ranges.systolic), VitalStatus::Normal);
        // spo2 high bound equals the range max, so 100 is critical
        assert_eq!(get_vital_status(100.0, &ranges.spo2), VitalStatus::Critical);
    }

    #[test]
    fn test_range_without_critical_bounds() {
        let range = VitalRange { min: 1.0, max: 2.0, unit: "x".to_string(), critical: None };
        assert_eq!(get_vital_status(-100.0, &range), VitalStatus::Abnormal);
        assert_eq!(get_vital_status(1.5, &range), VitalStatus::Normal);
    }

    #[test]
    fn test_bmi() {
        assert_eq!(calculate_bmi(170.0, 70.0), 24.2);
        assert_eq!(bmi_category(24.2), "Normal");
        assert_eq!(bmi_category(18.4), "Underweight");
        assert_eq!(bmi_category(30.0), "Obese Class I");
        assert_eq!(bmi_category(41.0), "Obese Class III");
    }

    #[test]
    fn test_critical_warnings() {
        let calm = reading(120.0, 80.0, 72.0, 98.6, Some(98.0));
        assert!(critical_warnings(&calm).is_empty());

        let crisis = reading(190.0, 125.0, 130.0, 104.0, Some(85.0));
        let warnings = critical_warnings(&crisis);
        assert_eq!(warnings.len(), 5);
        assert!(warnings[0].contains("Systolic BP > 180"));
        assert!(warnings.iter().any(|w| w.contains("High Fever")));

        // missing spo2 raises nothing
        let no_spo2 = reading(120.0, 80.0, 72.0, 98.6, None);
        assert!(critical_warnings(&no_spo2).is_empty());
    }

    #[test]
    fn test_classify_reading_uses_celsius() {
        let mut r = reading(150.0, 85.0, 72.0, 98.6, Some(97.0));
        r.height_cm = Some(170.0);
        r.weight_kg = Some(70.0);

        let c = classify_reading(&r, 40);
        assert_eq!(c.age_band, AgeBand::Adult);
        assert_eq!(c.systolic, VitalStatus::Abnormal);
        assert_eq!(c.temperature, VitalStatus::Normal);
        assert_eq!(c.spo2, Some(VitalStatus::Normal));
        assert_eq!(c.bmi, Some(24.2));
        assert_eq!(c.bmi_category.as_deref(), Some("Normal"));
    }
}
