use quiz_core::model::{ChoiceId, QuestionId, QuizId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn choice_id_from_i64(v: i64) -> Result<ChoiceId, StorageError> {
    Ok(ChoiceId::new(i64_to_u64("choice_id", v)?))
}

pub(crate) fn position_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid position: {v}")))
}

/// 1-based position for the item at `index`.
pub(crate) fn position_to_i64(index: usize) -> Result<i64, StorageError> {
    i64::try_from(index + 1).map_err(|_| StorageError::Serialization("position overflow".into()))
}

pub(crate) fn is_correct_from_i64(v: i64) -> Result<bool, StorageError> {
    match v {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StorageError::Serialization(format!(
            "invalid is_correct flag: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(quiz_id_from_i64(-1).is_err());
        assert_eq!(quiz_id_from_i64(3).unwrap(), QuizId::new(3));
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(position_to_i64(0).unwrap(), 1);
        assert_eq!(position_from_i64(4).unwrap(), 4);
        assert!(position_from_i64(-2).is_err());
    }

    #[test]
    fn correctness_flag_must_be_boolean() {
        assert!(is_correct_from_i64(1).unwrap());
        assert!(!is_correct_from_i64(0).unwrap());
        assert!(is_correct_from_i64(2).is_err());
    }
}
