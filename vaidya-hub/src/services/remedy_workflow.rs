//! Remedy submission and AI suggestion
//!
//! Submission order: validate, verify, insert, credit the submitter. Nothing
//! is written before the verifier accepts; a failed progress update removes
//! the inserted remedy again.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;
use vaidya_common::events::{EventBus, NoticeSeverity, VaidyaEvent};
use vaidya_common::models::{Remedy, MAX_RATING, MIN_RATING};

use super::collaborators::{
    CollaboratorError, RemedySuggester, RemedySuggestion, RemedyVerifier, VerificationRequest,
};
use super::data_uri;
use super::progress::{validate_profile_id, ProgressService};
use crate::config::VerificationMode;
use crate::error::{ApiError, FieldError};
use crate::store::RemedyRepository;

const MIN_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Store(#[from] vaidya_common::Error),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(errors) => ApiError::Validation(errors),
            WorkflowError::Collaborator(e) => ApiError::Collaborator(e),
            WorkflowError::Store(e) => ApiError::Common(e),
        }
    }
}

/// Attached photo, either raw bytes or an already encoded data URI
#[derive(Debug, Clone)]
pub enum Photo {
    Bytes(Vec<u8>),
    DataUri(String),
}

impl Photo {
    pub fn to_data_uri(&self) -> Result<String, data_uri::DataUriError> {
        match self {
            Photo::Bytes(bytes) => data_uri::encode_image(bytes),
            Photo::DataUri(uri) => data_uri::validate_image(uri),
        }
    }
}

/// Submission form as entered by the user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyForm {
    #[serde(default)]
    pub profile_id: String,
    #[serde(default)]
    pub plant_name: String,
    #[serde(default, rename = "remedyDescription")]
    pub description: String,
    #[serde(default)]
    pub language: String,
    /// Unvalidated; must end up in 1..=5
    #[serde(default)]
    pub effectiveness_rating: i64,
    #[serde(default)]
    pub photo_data_uri: Option<String>,
}

/// Form fields after validation
#[derive(Debug, Clone)]
struct ValidForm {
    plant_name: String,
    description: String,
    language: String,
    effectiveness_rating: u8,
    photo_data_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionOutcome {
    Accepted { remedy: Remedy },
    Rejected { notes: String },
}

fn validate(form: &RemedyForm, photo: Option<&Photo>) -> Result<ValidForm, Vec<FieldError>> {
    let mut errors = Vec::new();

    if validate_profile_id(&form.profile_id).is_err() {
        errors.push(FieldError::new("profileId", "A valid profile id is required."));
    }

    let plant_name = form.plant_name.trim();
    if plant_name.is_empty() {
        errors.push(FieldError::new("plantName", "Please select a plant."));
    }

    let description = form.description.trim();
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        errors.push(FieldError::new(
            "remedyDescription",
            format!(
                "Description must be at least {} characters.",
                MIN_DESCRIPTION_CHARS
            ),
        ));
    }

    let language = form.language.trim();
    if language.is_empty() {
        errors.push(FieldError::new("language", "Please select a language."));
    }

    let rating = u8::try_from(form.effectiveness_rating)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r));
    if rating.is_none() {
        errors.push(FieldError::new(
            "effectivenessRating",
            format!("Rating must be between {} and {}.", MIN_RATING, MAX_RATING),
        ));
    }

    let photo_data_uri = match photo {
        Some(photo) => match photo.to_data_uri() {
            Ok(uri) => Some(uri),
            Err(e) => {
                errors.push(FieldError::new("photo", e.to_string()));
                None
            }
        },
        None => None,
    };

    match rating {
        Some(effectiveness_rating) if errors.is_empty() => Ok(ValidForm {
            plant_name: plant_name.to_string(),
            description: description.to_string(),
            language: language.to_string(),
            effectiveness_rating,
            photo_data_uri,
        }),
        _ => Err(errors),
    }
}

pub struct RemedyWorkflow {
    repository: Arc<dyn RemedyRepository>,
    progress: Arc<ProgressService>,
    events: EventBus,
    verification: VerificationMode,
}

impl RemedyWorkflow {
    pub fn new(
        repository: Arc<dyn RemedyRepository>,
        progress: Arc<ProgressService>,
        events: EventBus,
        verification: VerificationMode,
    ) -> Self {
        Self {
            repository,
            progress,
            events,
            verification,
        }
    }

    fn notify(&self, profile_id: &str, severity: NoticeSeverity, title: &str, description: &str) {
        self.events.emit_lossy(VaidyaEvent::notice(
            Some(profile_id),
            severity,
            title,
            description,
        ));
    }

    /// Validate, verify and store a remedy
    ///
    /// The photo comes from `photo` when given, otherwise from the form's
    /// `photoDataUri`.
    pub async fn submit(
        &self,
        verifier: &dyn RemedyVerifier,
        form: RemedyForm,
        photo: Option<Photo>,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        let photo = photo.or_else(|| form.photo_data_uri.clone().map(Photo::DataUri));
        let valid = validate(&form, photo.as_ref()).map_err(WorkflowError::Validation)?;
        let profile_id = form.profile_id.as_str();

        let verdict = match self.verification {
            VerificationMode::Bypass => None,
            VerificationMode::Required => {
                let request = VerificationRequest {
                    plant_name: valid.plant_name.clone(),
                    remedy_description: valid.description.clone(),
                    language: valid.language.clone(),
                    effectiveness_rating: valid.effectiveness_rating,
                    photo_data_uri: valid.photo_data_uri.clone(),
                };
                match verifier.verify(&request).await {
                    Ok(verdict) => Some(verdict),
                    Err(e) => {
                        warn!(plant = %valid.plant_name, error = %e, "Remedy verification failed");
                        self.notify(
                            profile_id,
                            NoticeSeverity::Error,
                            "Submission Failed",
                            "An unexpected error occurred. Please try again.",
                        );
                        return Err(e.into());
                    }
                }
            }
        };

        if let Some(verdict) = verdict.as_ref().filter(|v| !v.is_plausible) {
            info!(plant = %valid.plant_name, notes = %verdict.notes, "Remedy rejected by verification");
            self.events.emit_lossy(VaidyaEvent::RemedyRejected {
                plant_name: valid.plant_name.clone(),
                notes: verdict.notes.clone(),
                timestamp: Utc::now(),
            });
            self.notify(
                profile_id,
                NoticeSeverity::Warning,
                "Submission Rejected by AI",
                &format!("Reason: {}", verdict.notes),
            );
            return Ok(SubmissionOutcome::Rejected {
                notes: verdict.notes.clone(),
            });
        }

        let remedy = Remedy {
            id: Uuid::new_v4().to_string(),
            plant_name: valid.plant_name,
            description: valid.description,
            language: valid.language,
            effectiveness_rating: valid.effectiveness_rating,
            photo_data_uri: valid.photo_data_uri,
            submitted_at: Utc::now(),
            upvotes: 0,
            downvotes: 0,
            is_plausible: verdict.as_ref().map(|v| v.is_plausible),
            verification_notes: verdict.map(|v| v.notes).filter(|n| !n.is_empty()),
        };

        self.repository.insert(&remedy).await?;

        if let Err(e) = self.progress.record_remedy(profile_id).await {
            error!(remedy_id = %remedy.id, error = %e, "Progress update failed, removing remedy");
            if let Err(remove_err) = self.repository.remove(&remedy.id).await {
                error!(remedy_id = %remedy.id, error = %remove_err, "Compensating removal failed");
            }
            return Err(e.into());
        }

        info!(remedy_id = %remedy.id, plant = %remedy.plant_name, "Remedy submitted");
        self.events.emit_lossy(VaidyaEvent::RemedySubmitted {
            remedy_id: remedy.id.clone(),
            plant_name: remedy.plant_name.clone(),
            timestamp: remedy.submitted_at,
        });
        self.notify(
            profile_id,
            NoticeSeverity::Info,
            "Remedy Submitted!",
            "Thank you for sharing your knowledge. Your remedy has been approved and saved.",
        );

        Ok(SubmissionOutcome::Accepted { remedy })
    }

    /// AI scan: draft a description and rating from a photo
    pub async fn suggest(
        &self,
        suggester: &dyn RemedySuggester,
        plant_name: &str,
        photo: Option<Photo>,
    ) -> Result<RemedySuggestion, WorkflowError> {
        let mut errors = Vec::new();
        let plant_name = plant_name.trim();
        if plant_name.is_empty() {
            errors.push(FieldError::new(
                "plantName",
                "Please select a plant name before using the AI scanner.",
            ));
        }
        let photo_data_uri = match photo.as_ref().map(Photo::to_data_uri) {
            Some(Ok(uri)) => Some(uri),
            Some(Err(e)) => {
                errors.push(FieldError::new("photo", e.to_string()));
                None
            }
            None => {
                errors.push(FieldError::new("photo", "Please upload a photo of the plant first."));
                None
            }
        };

        let photo_data_uri = match photo_data_uri {
            Some(uri) if errors.is_empty() => uri,
            _ => return Err(WorkflowError::Validation(errors)),
        };

        let suggestion = suggester.suggest(plant_name, &photo_data_uri).await?;
        info!(
            plant = %plant_name,
            effectiveness = suggestion.suggested_effectiveness,
            "Remedy suggestion generated"
        );
        Ok(suggestion)
    }
}
