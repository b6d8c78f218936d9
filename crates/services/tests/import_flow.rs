use flash_core::model::{Level, StudentDraft};
use flash_core::time::fixed_now;
use services::{AppServices, Clock, ExerciseServiceError};

#[tokio::test]
async fn sqlite_import_export_and_roster() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_import_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("connect sqlite");

    let table = "\
Group,Question ID,Num1,Num2,Num3,Num4,Num5,Num6,Num7,Answer
Group,Pairs,,,,,,,,
,1,3,4,,,,,,7
,2,-2,9,,,,,,7
";
    let report = services
        .exercises()
        .import_csv("junior_pairs.csv", table, Level::Junior, "teacher@example.com")
        .await
        .expect("import");
    assert_eq!(report.groups[0].name, "Pairs");
    assert_eq!(report.question_count, 2);

    let exported = services
        .exercises()
        .export_csv(Level::Junior)
        .await
        .expect("export");
    let reimported = services
        .exercises()
        .import_csv("junior_again.csv", &exported, Level::Junior, "teacher@example.com")
        .await
        .expect("reimport");
    assert_eq!(reimported.groups, report.groups);
    assert_eq!(
        services.exercises().export_csv(Level::Junior).await.unwrap(),
        exported
    );

    let files = services.exercises().list_csv_files().await.unwrap();
    assert_eq!(files.len(), 2);
    services
        .exercises()
        .delete_csv_file(files[0].id())
        .await
        .unwrap();
    assert_eq!(services.exercises().list_csv_files().await.unwrap().len(), 1);
    assert_eq!(
        services
            .exercises()
            .groups_for_level(Level::Junior)
            .await
            .unwrap()
            .len(),
        1
    );

    assert!(matches!(
        services
            .exercises()
            .import_csv("words.csv", "just words\nno commas\n", Level::Basic, "t")
            .await,
        Err(ExerciseServiceError::Parse(_))
    ));

    let student = services
        .students()
        .create_student(StudentDraft::new("Ada", Some(11), Level::Junior))
        .await
        .expect("create");
    assert_eq!(
        services.students().get_student(student.id()).await.unwrap(),
        Some(student.clone())
    );
    services.students().delete_student(student.id()).await.unwrap();
    assert!(services.students().list_students().await.unwrap().is_empty());
}
