use checklist_core::model::{StepIndex, Student, StudentId};
use checklist_core::time::fixed_now;
use storage::repository::{
    KeyValueStore, STUDENTS_KEY, SettingsRepository, Storage, StudentRepository,
};
use storage::sqlite::SqliteRepository;

fn build_student(name: &str, signed: u8) -> Student {
    let mut student =
        Student::new(StudentId::generate(), name, Some("11".into()), fixed_now()).unwrap();
    for i in 1..=signed {
        student
            .sign_step(StepIndex::new(i).unwrap(), "lm", None, fixed_now())
            .unwrap();
    }
    student
}

#[tokio::test]
async fn sqlite_roundtrip_persists_students() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_students?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.load_students().await.unwrap().is_empty());

    let students = vec![build_student("Ana", 7), build_student("Ben", 2)];
    repo.save_students(&students).await.unwrap();

    let loaded = repo.load_students().await.expect("load");
    assert_eq!(loaded, students);
    assert_eq!(loaded[0].percent_complete(), 100);
    assert_eq!(loaded[1].current_step_index(), StepIndex::new(3).unwrap());
}

#[tokio::test]
async fn sqlite_save_replaces_collection() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_replace?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.save_students(&[build_student("Ana", 0), build_student("Ben", 0)])
        .await
        .unwrap();
    let only = build_student("Cy", 1);
    repo.save_students(&[only.clone()]).await.unwrap();

    assert_eq!(repo.load_students().await.unwrap(), vec![only]);
}

#[tokio::test]
async fn sqlite_malformed_document_loads_empty() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_malformed?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.set_item(STUDENTS_KEY, "{\"students\": oops".into())
        .await
        .unwrap();
    assert!(repo.load_students().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_sqlite_shares_one_backend() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");

    storage.settings.save_staff_pin("9876").await.unwrap();
    storage
        .students
        .save_students(&[build_student("Ana", 3)])
        .await
        .unwrap();

    assert_eq!(
        storage.settings.get_staff_pin().await.unwrap().as_deref(),
        Some("9876")
    );
    assert_eq!(storage.students.load_students().await.unwrap().len(), 1);
}
