use anyhow::Result;
use checklist_core::model::StepIndex;
use services::{AppServices, StaffSession};

const DEMO_STUDENTS: [(&str, Option<&str>); 8] = [
    ("Ana Lopez", Some("9")),
    ("Ben Ortiz", Some("10")),
    ("Cara Lind", Some("9")),
    ("Dev Patel", Some("11")),
    ("Emi Sato", None),
    ("Finn Walsh", Some("12")),
    ("Gia Romano", Some("10")),
    ("Hugo Brandt", Some("9")),
];

const DEMO_STAFF: [&str; 3] = ["JD", "MK", "RT"];

/// Add `count` demo students, the n-th one signed through `n % 8` steps.
///
/// # Errors
///
/// Propagates service errors; students added before the failure stay.
pub async fn seed_roster(
    app: &mut AppServices,
    staff: &StaffSession,
    count: usize,
) -> Result<usize> {
    for n in 0..count {
        let (base, grade) = DEMO_STUDENTS[n % DEMO_STUDENTS.len()];
        let name = match n / DEMO_STUDENTS.len() {
            0 => base.to_owned(),
            round => format!("{base} {}", round + 1),
        };
        let id = app.students_mut().create_student(&name, grade).await?;

        let signed = n % (StepIndex::COUNT + 1);
        for index in StepIndex::all().take(signed) {
            let initials = DEMO_STAFF[usize::from(index.value()) % DEMO_STAFF.len()];
            app.students_mut()
                .sign_step(staff, id, index, initials, None)
                .await?;
        }
    }
    tracing::info!(count, "demo roster seeded");
    Ok(count)
}
