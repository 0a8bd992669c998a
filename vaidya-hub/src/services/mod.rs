//! Services layer: collaborators and the workflows built on them

pub mod chat;
pub mod collaborators;
pub mod data_uri;
pub mod genai;
pub mod identification;
pub mod progress;
pub mod pronunciation;
pub mod remedy_workflow;
pub mod voting;

pub use collaborators::{CollaboratorError, Collaborators};
pub use progress::{compute_badges, ProgressService};
pub use pronunciation::{PronunciationGame, TranscriptMatcher};
pub use remedy_workflow::RemedyWorkflow;
pub use voting::{RemedyBoard, SortMode, VotingService};
