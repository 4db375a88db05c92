use std::collections::HashMap;

use quiz_core::model::{Choice, ChoiceId, Question, QuizId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    choice_id_from_i64, conn, id_to_i64, is_correct_from_i64, position_from_i64, position_to_i64,
    question_id_from_i64, quiz_id_from_i64, ser,
};
use crate::repository::{
    NewQuizRecord, QuizListItem, QuizRepository, StorageError, StoredQuestion, StoredQuiz,
};

fn map_list_row(row: &SqliteRow) -> Result<QuizListItem, StorageError> {
    let count: i64 = row.try_get("question_count").map_err(ser)?;
    Ok(QuizListItem {
        id: quiz_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        uploaded_by: row.try_get("uploaded_by").map_err(ser)?,
        uploaded_at: row.try_get("uploaded_at").map_err(ser)?,
        question_count: u32::try_from(count)
            .map_err(|_| StorageError::Serialization(format!("invalid question count: {count}")))?,
    })
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO quizzes (title, uploaded_by, uploaded_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(quiz.title.as_str())
        .bind(quiz.uploaded_by.as_deref())
        .bind(quiz.uploaded_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let quiz_id = res.last_insert_rowid();

        for (index, question) in quiz.questions.iter().enumerate() {
            let res = sqlx::query(
                r"
                INSERT INTO questions (quiz_id, position, text)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(quiz_id)
            .bind(position_to_i64(index)?)
            .bind(question.text())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
            let question_id = res.last_insert_rowid();

            for (choice_index, choice) in question.choices().iter().enumerate() {
                sqlx::query(
                    r"
                    INSERT INTO choices (question_id, position, text, is_correct)
                    VALUES (?1, ?2, ?3, ?4)
                    ",
                )
                .bind(question_id)
                .bind(position_to_i64(choice_index)?)
                .bind(choice.text())
                .bind(i64::from(choice.is_correct()))
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            }
        }

        tx.commit().await.map_err(conn)?;
        quiz_id_from_i64(quiz_id)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<StoredQuiz>, StorageError> {
        let quiz_id = id_to_i64("quiz_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let Some(quiz_row) = sqlx::query(
            r"
            SELECT id, title, uploaded_by, uploaded_at
            FROM quizzes WHERE id = ?1
            ",
        )
        .bind(quiz_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(conn)?
        else {
            return Ok(None);
        };

        let question_rows = sqlx::query(
            r"
            SELECT id, position, text
            FROM questions
            WHERE quiz_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(quiz_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(conn)?;

        let choice_rows = sqlx::query(
            r"
            SELECT c.id, c.question_id, c.text, c.is_correct
            FROM choices c
            JOIN questions q ON q.id = c.question_id
            WHERE q.quiz_id = ?1
            ORDER BY q.position ASC, c.position ASC
            ",
        )
        .bind(quiz_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        let mut choices_by_question: HashMap<i64, Vec<(ChoiceId, Choice)>> = HashMap::new();
        for row in &choice_rows {
            let question_id: i64 = row.try_get("question_id").map_err(ser)?;
            let choice = Choice::new(
                row.try_get::<String, _>("text").map_err(ser)?,
                is_correct_from_i64(row.try_get::<i64, _>("is_correct").map_err(ser)?)?,
            )
            .map_err(ser)?;
            let choice_id = choice_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
            choices_by_question
                .entry(question_id)
                .or_default()
                .push((choice_id, choice));
        }

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in &question_rows {
            let raw_id: i64 = row.try_get("id").map_err(ser)?;
            let (choice_ids, choices): (Vec<_>, Vec<_>) = choices_by_question
                .remove(&raw_id)
                .unwrap_or_default()
                .into_iter()
                .unzip();
            let question =
                Question::new(row.try_get::<String, _>("text").map_err(ser)?, choices)
                    .map_err(ser)?;
            questions.push(StoredQuestion {
                id: question_id_from_i64(raw_id)?,
                position: position_from_i64(row.try_get::<i64, _>("position").map_err(ser)?)?,
                question,
                choice_ids,
            });
        }

        Ok(Some(StoredQuiz {
            id: quiz_id_from_i64(quiz_row.try_get::<i64, _>("id").map_err(ser)?)?,
            title: quiz_row.try_get("title").map_err(ser)?,
            uploaded_by: quiz_row.try_get("uploaded_by").map_err(ser)?,
            uploaded_at: quiz_row.try_get("uploaded_at").map_err(ser)?,
            questions,
        }))
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizListItem>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT z.id, z.title, z.uploaded_by, z.uploaded_at, COUNT(q.id) AS question_count
            FROM quizzes z
            LEFT JOIN questions q ON q.quiz_id = z.id
            GROUP BY z.id
            ORDER BY z.uploaded_at DESC, z.id DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_list_row).collect()
    }
}
