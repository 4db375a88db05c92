use chrono::Duration;
use quiz_core::model::{Choice, Question, QuizId};
use quiz_core::parser;
use quiz_core::time::fixed_now;
use storage::repository::{NewQuizRecord, QuizRepository};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_keeps_order_and_flags() {
    let repo = connect("memdb_quiz_roundtrip").await;
    let questions =
        parser::parse("2+2?\n* 3\n+ 4\n* 5\nCapital of France?\n+ Paris\n* London\n").unwrap();

    let id = repo
        .insert_quiz(NewQuizRecord::new(
            "sample.txt",
            Some("ana".into()),
            fixed_now(),
            questions.clone(),
        ))
        .await
        .unwrap();

    let stored = repo.get_quiz(id).await.unwrap().expect("stored quiz");
    assert_eq!(stored.id, id);
    assert_eq!(stored.title, "sample.txt");
    assert_eq!(stored.uploaded_by.as_deref(), Some("ana"));
    assert_eq!(stored.uploaded_at, fixed_now());
    assert_eq!(stored.to_questions(), questions);

    let positions: Vec<_> = stored.questions.iter().map(|q| q.position).collect();
    assert_eq!(positions, [1, 2]);
    assert_eq!(stored.questions[0].choice_ids.len(), 3);
}

#[tokio::test]
async fn sqlite_lists_newest_first_with_counts() {
    let repo = connect("memdb_quiz_listing").await;
    let choice = Choice::correct("a").unwrap();
    let question = Question::new("Q", vec![choice]).unwrap();

    repo.insert_quiz(NewQuizRecord::new(
        "first",
        None,
        fixed_now(),
        vec![question.clone()],
    ))
    .await
    .unwrap();
    repo.insert_quiz(NewQuizRecord::new(
        "second",
        None,
        fixed_now() + Duration::hours(1),
        vec![question.clone(), question.clone(), question],
    ))
    .await
    .unwrap();

    let listed = repo.list_quizzes(10).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "second");
    assert_eq!(listed[0].question_count, 3);
    assert_eq!(listed[1].title, "first");
    assert_eq!(listed[1].question_count, 1);
}

#[tokio::test]
async fn sqlite_missing_quiz_is_none() {
    let repo = connect("memdb_quiz_missing").await;
    assert!(repo.get_quiz(QuizId::new(404)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_quiz_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    assert!(repo.list_quizzes(5).await.unwrap().is_empty());
}
