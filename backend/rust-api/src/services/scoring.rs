//! Answer evaluation and the score/penalty rules.
//!
//! Everything here is synchronous and side-effect free apart from the
//! `UserRecord` it is handed; callers run it inside [`StateStore::mutate`]
//! so that evaluation and the follow-up snapshot form one atomic step.
//!
//! [`StateStore::mutate`]: super::state_store::StateStore::mutate

use chrono::{DateTime, Utc};

use crate::models::{AnswerOutcome, AttemptRecord, QuestionDefinition, UserRecord};

/// Case- and surrounding-whitespace-insensitive form of an answer.
pub fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

pub fn answers_match(submitted: &str, expected: &str) -> bool {
    normalize(submitted) == normalize(expected)
}

/// Records `answer` for `question` and applies its scoring effect to `user`.
///
/// * already solved: the attempt is recorded as correct, score untouched
/// * correct: question score added, highest-solved marker raised if lower
/// * wrong: every `penalty_try_count`-th wrong attempt costs `penalty`,
///   never taking the total below zero
pub fn evaluate(
    user: &mut UserRecord,
    question: &QuestionDefinition,
    answer: &str,
    now: DateTime<Utc>,
) -> AnswerOutcome {
    let expected = question.correct_answer_for(&user.username).to_string();
    let progress = user.progress_mut(question.id);

    if progress.is_solved() {
        progress.attempt_history.push(AttemptRecord {
            question_id: question.id,
            answer: answer.to_string(),
            correct: true,
            at: now,
        });
        return AnswerOutcome::AlreadySolved;
    }

    let correct = answers_match(answer, &expected);
    progress.attempt_history.push(AttemptRecord {
        question_id: question.id,
        answer: answer.to_string(),
        correct,
        at: now,
    });

    if correct {
        user.total_score += question.score;
        // Any higher solved id moves the marker, even when questions were skipped.
        if question.id > user.last_solved_question {
            user.last_solved_question = question.id;
        }
        return AnswerOutcome::Correct;
    }

    let wrong_attempts = progress.count_by_correctness(false);
    if wrong_attempts % question.penalty_period() as usize == 0 {
        user.total_score = (user.total_score - question.penalty).max(0);
    }
    AnswerOutcome::Incorrect
}
