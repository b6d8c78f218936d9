use std::path::Path;

use flash_core::model::{CsvFileId, Level, StudentDraft, StudentId};
use services::AppServices;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn import(
    services: &AppServices,
    file: &Path,
    level: Option<Level>,
    uploaded_by: &str,
) -> CommandResult {
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let level = level.unwrap_or_else(|| Level::from_file_name(&file_name));
    let content = tokio::fs::read_to_string(file).await?;

    let accounts = services.accounts();
    let teacher = accounts.login_teacher(uploaded_by)?;
    let report = services
        .exercises()
        .import_csv(&file_name, &content, level, teacher.display_name())
        .await;
    accounts.logout(teacher);
    let report = report?;

    println!(
        "imported {} ({level}): {} groups, {} questions",
        report.file.file_name(),
        report.groups.len(),
        report.question_count
    );
    for group in &report.groups {
        println!("  {}\t{}", group.name, group.question_count);
    }
    Ok(())
}

pub async fn export(services: &AppServices, level: Level, out: Option<&Path>) -> CommandResult {
    let table = services.exercises().export_csv(level).await?;
    match out {
        Some(path) => tokio::fs::write(path, table).await?,
        None => print!("{table}"),
    }
    Ok(())
}

pub async fn groups(services: &AppServices, level: Level) -> CommandResult {
    let groups = services.exercises().groups_for_level(level).await?;
    if groups.is_empty() {
        println!("no groups for {level}");
    }
    for group in &groups {
        println!("{}\t{} questions", group.group(), group.question_count());
    }
    Ok(())
}

pub async fn files(services: &AppServices) -> CommandResult {
    for file in services.exercises().list_csv_files().await? {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            file.id(),
            file.file_name(),
            file.level(),
            file.uploaded_by(),
            file.uploaded_at().to_rfc3339()
        );
    }
    Ok(())
}

pub async fn remove_file(services: &AppServices, id: u64) -> CommandResult {
    services.exercises().delete_csv_file(CsvFileId::new(id)).await?;
    println!("removed upload record {id}");
    Ok(())
}

pub async fn list_students(services: &AppServices) -> CommandResult {
    for student in services.students().list_students().await? {
        let age = student
            .age()
            .map_or_else(|| "-".to_string(), |age| age.to_string());
        println!(
            "{}\t{}\t{}\tage {age}\t{} ms\t{} s",
            student.id(),
            student.name(),
            student.classroom(),
            student.flash_interval_ms(),
            student.response_time_secs()
        );
    }
    Ok(())
}

pub async fn add_student(
    services: &AppServices,
    name: String,
    age: Option<u8>,
    classroom: Level,
    flash_speed: Option<u32>,
    response_time: Option<u32>,
) -> CommandResult {
    let mut draft = StudentDraft::new(name, age, classroom);
    if let Some(ms) = flash_speed {
        draft = draft.with_flash_interval_ms(ms);
    }
    if let Some(secs) = response_time {
        draft = draft.with_response_time_secs(secs);
    }
    let student = services.students().create_student(draft).await?;
    println!("added student {} ({})", student.id(), student.name());
    Ok(())
}

/// Fields to overwrite on an existing student.
#[derive(Debug, Default)]
pub struct StudentChanges {
    pub name: Option<String>,
    pub age: Option<u8>,
    pub classroom: Option<Level>,
    pub flash_speed: Option<u32>,
    pub response_time: Option<u32>,
}

#[derive(Debug)]
pub struct UnknownStudent(u64);

impl std::fmt::Display for UnknownStudent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no student with id {}", self.0)
    }
}

impl std::error::Error for UnknownStudent {}

pub async fn update_student(
    services: &AppServices,
    id: u64,
    changes: StudentChanges,
) -> CommandResult {
    let students = services.students();
    let current = students
        .get_student(StudentId::new(id))
        .await?
        .ok_or(UnknownStudent(id))?;

    let mut draft = current.to_draft();
    if let Some(name) = changes.name {
        draft.name = name;
    }
    if let Some(age) = changes.age {
        draft.age = Some(age);
    }
    if let Some(classroom) = changes.classroom {
        draft.classroom = classroom;
    }
    if let Some(ms) = changes.flash_speed {
        draft = draft.with_flash_interval_ms(ms);
    }
    if let Some(secs) = changes.response_time {
        draft = draft.with_response_time_secs(secs);
    }

    let student = students.update_student(current.id(), draft).await?;
    println!(
        "updated student {} ({}, {} ms)",
        student.id(),
        student.name(),
        student.flash_interval_ms()
    );
    Ok(())
}

pub async fn remove_student(services: &AppServices, id: u64) -> CommandResult {
    services.students().delete_student(StudentId::new(id)).await?;
    println!("removed student {id}");
    Ok(())
}

pub async fn progress(services: &AppServices, student_id: u64) -> CommandResult {
    let summary = services
        .progress()
        .group_progress(StudentId::new(student_id))
        .await?;
    if summary.is_empty() {
        println!("no saved answers for student {student_id}");
    }
    for group in &summary {
        println!(
            "{}\t{}\t{}/{}\t{}%",
            group.level,
            group.exercise_group,
            group.correct,
            group.total,
            group.percentage()
        );
    }
    Ok(())
}
