use chrono::Duration;
use flash_core::chunking::{merge_chunks, split_into_chunks};
use flash_core::model::{
    CsvFileDraft, ExerciseGroup, Level, ProgressRecord, Question, StudentDraft, StudentId,
};
use flash_core::time::fixed_now;
use storage::repository::{
    CsvFileRepository, ExerciseRepository, ProgressRepository, StorageError, StudentRepository,
};
use storage::sqlite::SqliteRepository;
use uuid::Uuid;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn group(level: Level, name: &str, count: u32) -> ExerciseGroup {
    let questions = (1..=count)
        .map(|id| Question::new(id, vec![f64::from(id), 0.5, 0.5], f64::from(id) + 1.0).unwrap())
        .collect();
    ExerciseGroup::new(level, name, questions).unwrap()
}

#[tokio::test]
async fn sqlite_students_roundtrip_and_lookup() {
    let repo = connect("memdb_students").await;

    let draft = StudentDraft::new("Ada", Some(10), Level::Junior).with_flash_interval_ms(750);
    let ada = repo
        .insert_new_student(draft.validate(fixed_now()).unwrap())
        .await
        .unwrap();
    let lin = repo
        .insert_new_student(
            StudentDraft::first_login("lin", Level::Basic)
                .validate(fixed_now())
                .unwrap(),
        )
        .await
        .unwrap();

    let fetched = repo.get_student(ada.id()).await.unwrap().expect("stored");
    assert_eq!(fetched, ada);
    assert_eq!(fetched.flash_interval_ms(), 750);

    let found = repo
        .find_student_by_name("ADA", Level::Junior)
        .await
        .unwrap();
    assert_eq!(found.map(|s| s.id()), Some(ada.id()));

    let names: Vec<String> = repo
        .list_students()
        .await
        .unwrap()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(names, vec!["Ada", "lin"]);

    let mut draft = lin.to_draft();
    draft.age = Some(7);
    let updated = draft
        .validate(lin.created_at())
        .unwrap()
        .assign_id(lin.id());
    repo.upsert_student(&updated).await.unwrap();
    let reloaded = repo.get_student(lin.id()).await.unwrap().unwrap();
    assert_eq!(reloaded.age(), Some(7));

    repo.delete_student(ada.id()).await.unwrap();
    assert!(repo.get_student(ada.id()).await.unwrap().is_none());
    assert!(matches!(
        repo.delete_student(ada.id()).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_chunks_replace_one_level_and_merge_back() {
    let repo = connect("memdb_chunks").await;

    let big = group(Level::Basic, "Big", 230);
    let small = group(Level::Junior, "Small", 4);
    let big_chunks = split_into_chunks(&big, 100).unwrap();
    assert_eq!(big_chunks.len(), 3);

    repo.replace_level_chunks(Level::Basic, &big_chunks)
        .await
        .unwrap();
    repo.replace_level_chunks(Level::Junior, &split_into_chunks(&small, 100).unwrap())
        .await
        .unwrap();

    let basic = merge_chunks(repo.list_chunks(Some(Level::Basic)).await.unwrap()).unwrap();
    assert_eq!(basic, vec![big]);

    let replacement = group(Level::Basic, "Replacement", 2);
    repo.replace_level_chunks(Level::Basic, &split_into_chunks(&replacement, 100).unwrap())
        .await
        .unwrap();

    let all = merge_chunks(repo.list_chunks(None).await.unwrap()).unwrap();
    assert_eq!(all, vec![small, replacement]);

    assert_eq!(repo.delete_level_chunks(Level::Junior).await.unwrap(), 1);
    assert_eq!(repo.delete_all_chunks().await.unwrap(), 1);
}

#[tokio::test]
async fn sqlite_failed_replace_keeps_previous_chunks() {
    let repo = connect("memdb_replace_conflict").await;

    let original = group(Level::Basic, "Original", 3);
    repo.replace_level_chunks(Level::Basic, &split_into_chunks(&original, 100).unwrap())
        .await
        .unwrap();

    let wrong_level = split_into_chunks(&group(Level::Junior, "J", 1), 100).unwrap();
    assert!(matches!(
        repo.replace_level_chunks(Level::Basic, &wrong_level).await,
        Err(StorageError::Conflict)
    ));

    let existing = repo.list_chunks(Some(Level::Basic)).await.unwrap();
    assert!(matches!(
        repo.insert_chunk(&existing[0]).await,
        Err(StorageError::Conflict)
    ));

    let kept = merge_chunks(repo.list_chunks(Some(Level::Basic)).await.unwrap()).unwrap();
    assert_eq!(kept, vec![original]);
}

#[tokio::test]
async fn sqlite_progress_batches_are_ordered_per_student() {
    let repo = connect("memdb_progress").await;
    let g = group(Level::Junior, "Sums", 3);
    let session = Uuid::new_v4();

    let records: Vec<ProgressRecord> = g
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let student = StudentId::new(if i == 1 { 2 } else { 1 });
            let at = fixed_now() + Duration::seconds(i64::try_from(i).unwrap());
            ProgressRecord::answered(session, student, &g, q, "2", at)
        })
        .collect();

    assert_eq!(repo.append_batch(&records).await.unwrap(), 3);

    let first = repo
        .progress_for_student(StudentId::new(1))
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0], records[0]);
    assert_eq!(first[1], records[2]);
    assert!(first[0].is_correct());
    assert!(!first[1].is_correct());
    assert_eq!(first[0].session_id(), session);

    assert_eq!(repo.list_progress().await.unwrap().len(), 3);
}

#[tokio::test]
async fn sqlite_csv_files_newest_first() {
    let repo = connect("memdb_csv_files").await;

    let mut ids = Vec::new();
    for (offset, name) in [(0, "basic.csv"), (30, "junior_set.csv")] {
        let file = CsvFileDraft::new(name, Level::from_file_name(name), "teacher@example.com")
            .validate(fixed_now() + Duration::seconds(offset))
            .unwrap();
        ids.push(repo.insert_csv_file(file).await.unwrap().id());
    }

    let files = repo.list_csv_files().await.unwrap();
    assert_eq!(files[0].file_name(), "junior_set.csv");
    assert_eq!(files[0].level(), Level::Junior);
    assert_eq!(files[1].level(), Level::Basic);

    let got = repo.get_csv_file(ids[0]).await.unwrap().unwrap();
    assert_eq!(got.uploaded_at(), fixed_now());

    repo.delete_csv_file(ids[0]).await.unwrap();
    assert!(repo.get_csv_file(ids[0]).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_rejected_upload_record_rolls_back_chunks() {
    let repo = connect("memdb_import_atomic").await;

    let original = group(Level::Basic, "Original", 2);
    let upload = |name: &str| {
        CsvFileDraft::new(name, Level::Basic, "teacher@example.com")
            .validate(fixed_now())
            .unwrap()
    };
    let first = repo
        .replace_level_with_file(
            Level::Basic,
            &split_into_chunks(&original, 100).unwrap(),
            upload("basic.csv"),
        )
        .await
        .unwrap();
    assert_eq!(first.file_name(), "basic.csv");

    let mut blank = upload("again.csv");
    blank.file_name = "  ".into();
    let replacement = split_into_chunks(&group(Level::Basic, "Replacement", 3), 100).unwrap();
    assert!(matches!(
        repo.replace_level_with_file(Level::Basic, &replacement, blank).await,
        Err(StorageError::Conflict)
    ));

    let kept = merge_chunks(repo.list_chunks(Some(Level::Basic)).await.unwrap()).unwrap();
    assert_eq!(kept, vec![original]);
    assert_eq!(repo.list_csv_files().await.unwrap(), vec![first]);
}
