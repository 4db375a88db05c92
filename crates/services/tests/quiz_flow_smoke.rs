use quiz_core::SessionPhase;
use quiz_core::time::fixed_now;
use services::{Clock, QuestionView, QuizServices, QuizUpload, SessionKey};

fn quiz_text(count: usize) -> String {
    (0..count)
        .map(|i| format!("What is {i} + 1?\n* {i}\n+ {}\n", i + 1))
        .collect()
}

fn right_answer(view: &QuestionView) -> String {
    let n: usize = view
        .text
        .trim_start_matches("What is ")
        .trim_end_matches(" + 1?")
        .parse()
        .unwrap();
    format!("  {} ", n + 1)
}

#[tokio::test]
async fn upload_play_and_finish() {
    let services = QuizServices::in_memory(Clock::fixed(fixed_now()), Some(3));
    let key = SessionKey::new("smoke");

    let started = services
        .upload_and_begin(
            &key,
            QuizUpload::new("sums.txt", quiz_text(4)).with_uploaded_by(Some("tester".into())),
        )
        .await
        .unwrap();
    assert_eq!(started.parsed_questions, 4);

    let loop_svc = services.sessions();
    let mut current = started.first;
    let mut seen = Vec::new();
    let mut last = None;
    while let Some(view) = current {
        seen.push(view.index);
        let answer = if seen.len() == 1 {
            "wrong".to_owned()
        } else {
            right_answer(&view)
        };
        let feedback = loop_svc.submit_answer(&key, view.index, &answer).unwrap();

        // A second submission for the same question never moves the score.
        let again = loop_svc
            .submit_answer(&key, view.index, &right_answer(&view))
            .unwrap();
        assert_eq!(again.score, feedback.score);

        current = feedback.next.clone();
        last = Some(feedback);
    }

    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);

    let last = last.unwrap();
    assert!(last.finished);
    let summary = last.summary.unwrap();
    assert_eq!((summary.score, summary.total, summary.errors), (3, 4, 1));
    assert_eq!(loop_svc.phase(&key).unwrap(), SessionPhase::Finished);

    let listed = services.list_quizzes(10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "sums.txt");
    assert_eq!(listed[0].question_count, 4);
}

#[tokio::test]
async fn large_upload_is_capped_per_attempt() {
    let services = QuizServices::in_memory(Clock::fixed(fixed_now()), Some(11));
    let key = SessionKey::new("big");

    let started = services
        .upload_and_begin(&key, QuizUpload::new("big.txt", quiz_text(45)))
        .await
        .unwrap();
    assert_eq!(started.parsed_questions, 45);
    assert_eq!(started.first.as_ref().unwrap().total, 30);

    let loop_svc = services.sessions();
    let mut current = started.first;
    let mut answered = 0;
    while let Some(view) = current {
        answered += 1;
        current = loop_svc.submit_answer(&key, view.index, "?").unwrap().next;
    }
    assert_eq!(answered, 30);

    let listed = services.list_quizzes(10).await.unwrap();
    assert_eq!(listed[0].question_count, 45);
}

#[tokio::test]
async fn replay_starts_fresh_attempt_from_sqlite() {
    let url = "sqlite:file:services_replay?mode=memory&cache=shared";
    let services = QuizServices::new_sqlite(url, Clock::fixed(fixed_now()), Some(5))
        .await
        .unwrap();
    let key = SessionKey::new("replayer");

    let started = services
        .upload_and_begin(&key, QuizUpload::new("two.txt", quiz_text(2)))
        .await
        .unwrap();
    let first = started.first.unwrap();
    services
        .sessions()
        .submit_answer(&key, first.index, &right_answer(&first))
        .unwrap();

    let replayed = services.replay(&key, started.quiz_id).await.unwrap();
    assert_eq!(replayed.parsed_questions, 2);
    let progress = services.sessions().progress(&key).unwrap();
    assert_eq!((progress.answered, progress.score, progress.total), (0, 0, 2));

    services.end(&key).unwrap();
    assert_eq!(services.sessions().phase(&key).unwrap(), SessionPhase::Idle);
}
