use axum::extract::{Json, Query};
use tracing::{debug, instrument};

use ayuu_domain::entities::{RiskInput, VitalRanges};
use ayuu_domain::services::appointment::DEFAULT_PATIENT_AGE;
use ayuu_domain::services::vitals::{bmi_for, critical_warnings};
use ayuu_domain::services::{calculate_cardiovascular_risk, classify_reading, get_vital_ranges};

use crate::entities::vitals::{AssessmentRequest, AssessmentResponse, RangesQuery};

/// Reference ranges for a patient's age band
#[utoipa::path(
    get,
    path = "/api/v1/vitals/ranges",
    params(RangesQuery),
    responses(
        (status = 200, description = "Reference ranges", body = VitalRanges),
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument]
pub async fn vital_ranges(Query(query): Query<RangesQuery>) -> Json<VitalRanges> {
    Json(get_vital_ranges(query.age.unwrap_or(DEFAULT_PATIENT_AGE)))
}

/// Classify a reading and score its cardiovascular risk without saving it
#[utoipa::path(
    post,
    path = "/api/v1/vitals/assessment",
    request_body = AssessmentRequest,
    responses(
        (status = 200, description = "Assessment of the reading", body = AssessmentResponse),
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(request), fields(age = request.age))]
pub async fn assess_vitals(Json(request): Json<AssessmentRequest>) -> Json<AssessmentResponse> {
    let bmi = bmi_for(&request.reading);
    let assessment = calculate_cardiovascular_risk(&RiskInput::from_reading(&request.reading, request.age, bmi));
    debug!("Ad-hoc assessment scored {}", assessment.score);

    Json(AssessmentResponse {
        classification: classify_reading(&request.reading, request.age),
        assessment,
        warnings: critical_warnings(&request.reading),
    })
}
