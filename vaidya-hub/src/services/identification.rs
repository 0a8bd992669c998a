//! Plant identification from a photo

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use vaidya_common::events::{EventBus, NoticeSeverity, VaidyaEvent};
use vaidya_common::models::IdentificationResult;

use super::collaborators::PlantIdentifier;
use super::progress::{validate_profile_id, ProgressService};
use super::remedy_workflow::{Photo, WorkflowError};
use crate::error::FieldError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationOutcome {
    pub result: IdentificationResult,
    /// 25 for a newly discovered plant, otherwise 0
    pub points_awarded: u64,
    pub total_points: u64,
}

pub struct IdentificationService {
    progress: Arc<ProgressService>,
    events: EventBus,
}

impl IdentificationService {
    pub fn new(progress: Arc<ProgressService>, events: EventBus) -> Self {
        Self { progress, events }
    }

    /// Identify the plant on `photo` and credit the profile for new plants
    ///
    /// A photo without a plant is a validation error on the `photo` field.
    pub async fn identify(
        &self,
        identifier: &dyn PlantIdentifier,
        profile_id: &str,
        photo: Photo,
    ) -> Result<IdentificationOutcome, WorkflowError> {
        let mut errors = Vec::new();
        if validate_profile_id(profile_id).is_err() {
            errors.push(FieldError::new("profileId", "A valid profile id is required."));
        }
        let photo_data_uri = match photo.to_data_uri() {
            Ok(uri) => Some(uri),
            Err(e) => {
                errors.push(FieldError::new("photo", e.to_string()));
                None
            }
        };
        let photo_data_uri = match photo_data_uri {
            Some(uri) if errors.is_empty() => uri,
            _ => return Err(WorkflowError::Validation(errors)),
        };

        let result = identifier.identify(&photo_data_uri).await?;

        if !result.is_plant {
            self.events.emit_lossy(VaidyaEvent::notice(
                Some(profile_id),
                NoticeSeverity::Warning,
                "Not a plant",
                "The image does not appear to contain a plant. Please try another photo.",
            ));
            return Err(WorkflowError::Validation(vec![FieldError::new(
                "photo",
                "The image does not appear to contain a plant.",
            )]));
        }

        let plant_key = if result.scientific_name.trim().is_empty() {
            result.common_name.trim().to_string()
        } else {
            result.scientific_name.trim().to_string()
        };

        let (progress, points_awarded) = if plant_key.is_empty() {
            (self.progress.get(profile_id).await?, 0)
        } else {
            self.progress
                .record_identification(profile_id, &plant_key)
                .await?
        };

        info!(
            profile = %profile_id,
            plant = %plant_key,
            points_awarded,
            "Plant identified"
        );

        Ok(IdentificationOutcome {
            result,
            points_awarded,
            total_points: progress.points,
        })
    }
}
