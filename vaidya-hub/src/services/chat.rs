//! Knowledge chat about medicinal plants

use tracing::debug;

use super::collaborators::KnowledgeChat;
use super::remedy_workflow::WorkflowError;
use crate::error::FieldError;

const MAX_QUERY_CHARS: usize = 2000;

/// Answer `query` under the assistant persona
pub async fn ask(chat: &dyn KnowledgeChat, query: &str) -> Result<String, WorkflowError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(WorkflowError::Validation(vec![FieldError::new(
            "query",
            "Please enter a question.",
        )]));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(WorkflowError::Validation(vec![FieldError::new(
            "query",
            format!("Questions are limited to {} characters.", MAX_QUERY_CHARS),
        )]));
    }

    debug!(chars = query.chars().count(), "Knowledge chat query");
    Ok(chat.answer(query).await?)
}
