pub mod answer;
pub mod progress;
pub mod prompt;
pub mod question;
pub mod roster;
pub mod user;

use serde::{Deserialize, Deserializer};

pub use answer::{AnswerOutcome, SubmitAnswerRequest, SubmitAnswerResponse};
pub use progress::{AttemptRecord, ConversationTurn, QuestionProgress, StateDocument, UserRecord};
pub use prompt::{PromptRequest, PromptResponse, RelayMessage};
pub use question::{Persona, QuestionDefinition};
pub use roster::{RosterEntry, RosterResponse, SolvedQuestion};
pub use user::{BaseResponse, IdentityRecord, LoginRequest, LoginResponse};

/// Reads an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
