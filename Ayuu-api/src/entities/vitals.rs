use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use ayuu_domain::entities::{CardiovascularRiskAssessment, VitalReading, VitalsClassification};

/// Query parameters for the reference range lookup
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RangesQuery {
    /// Patient age in years (default: 35)
    pub age: Option<i32>,
}

/// Stateless assessment of one reading
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssessmentRequest {
    pub reading: VitalReading,
    /// Patient age in years
    pub age: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssessmentResponse {
    pub classification: VitalsClassification,
    pub assessment: CardiovascularRiskAssessment,
    /// Critical alert strings raised by the reading
    pub warnings: Vec<String>,
}
