//! Linear gating rules over a student's step list.
//!
//! Step 1 is always open. Every later step opens once the step right before it
//! has been signed off, and the only way back is a full reset.

use crate::model::{ProgressError, SignOff, StepIndex, StepStatus};

/// Ordered step list, one slot per catalog entry.
pub type Steps = [StepStatus; StepIndex::COUNT];

/// Returns a step list with every step pending.
#[must_use]
pub fn pending_steps() -> Steps {
    std::array::from_fn(|_| StepStatus::Pending)
}

/// True when the step before `index` has not been signed off.
#[must_use]
pub fn is_locked(steps: &Steps, index: StepIndex) -> bool {
    index
        .previous()
        .is_some_and(|prev| !steps[prev.slot()].is_completed())
}

/// Records a sign-off on `index`.
///
/// Re-signing a completed step overwrites the previous sign-off.
///
/// # Errors
///
/// Returns `ProgressError::StepLocked` if the previous step is still pending.
/// The step list is untouched on error.
pub fn sign(steps: &mut Steps, index: StepIndex, sign_off: SignOff) -> Result<(), ProgressError> {
    if is_locked(steps, index) {
        return Err(ProgressError::StepLocked {
            index: index.value(),
        });
    }
    steps[index.slot()] = StepStatus::Completed(sign_off);
    Ok(())
}

#[must_use]
pub fn completed_count(steps: &Steps) -> usize {
    steps.iter().filter(|s| s.is_completed()).count()
}

/// `round(100 * completed / 7)`, halves rounded up.
#[must_use]
pub fn percent_complete(steps: &Steps) -> u8 {
    let total = StepIndex::COUNT;
    let done = completed_count(steps);
    let pct = (200 * done + total) / (2 * total);
    u8::try_from(pct).unwrap_or(100)
}

/// First pending step, or the last step once everything is signed.
#[must_use]
pub fn current_step_index(steps: &Steps) -> StepIndex {
    StepIndex::all()
        .find(|index| !steps[index.slot()].is_completed())
        .unwrap_or(StepIndex::LAST)
}

/// First completed step whose predecessor is still pending, if any.
///
/// A well-formed list never has one; this guards data coming back from storage.
#[must_use]
pub fn first_gating_violation(steps: &Steps) -> Option<StepIndex> {
    StepIndex::all().find(|index| steps[index.slot()].is_completed() && is_locked(steps, *index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn step(n: u8) -> StepIndex {
        StepIndex::new(n).unwrap()
    }

    fn signed() -> SignOff {
        SignOff::new("MK", None, fixed_now()).unwrap()
    }

    fn completed_through(n: u8) -> Steps {
        let mut steps = pending_steps();
        for i in 1..=n {
            sign(&mut steps, step(i), signed()).unwrap();
        }
        steps
    }

    #[test]
    fn first_step_is_never_locked() {
        assert!(!is_locked(&pending_steps(), StepIndex::FIRST));
    }

    #[test]
    fn later_steps_unlock_one_at_a_time() {
        for done in 0..7 {
            let steps = completed_through(done);
            for i in 2..=7 {
                assert_eq!(is_locked(&steps, step(i)), i > done + 1, "done={done} i={i}");
            }
        }
    }

    #[test]
    fn signing_a_locked_step_leaves_list_untouched() {
        let mut steps = completed_through(1);
        let before = steps.clone();
        let err = sign(&mut steps, step(3), signed()).unwrap_err();
        assert_eq!(err, ProgressError::StepLocked { index: 3 });
        assert_eq!(steps, before);
    }

    #[test]
    fn percent_follows_rounded_sevenths() {
        let expected: [u8; 8] = [0, 14, 29, 43, 57, 71, 86, 100];
        for (done, pct) in expected.iter().enumerate() {
            let steps = completed_through(u8::try_from(done).unwrap());
            assert_eq!(percent_complete(&steps), *pct);
        }
    }

    #[test]
    fn current_step_tracks_first_pending() {
        assert_eq!(current_step_index(&pending_steps()), StepIndex::FIRST);
        assert_eq!(current_step_index(&completed_through(3)), step(4));
        assert_eq!(current_step_index(&completed_through(7)), StepIndex::LAST);
    }

    #[test]
    fn detects_out_of_order_completion() {
        let mut steps = pending_steps();
        steps[step(4).slot()] = StepStatus::Completed(signed());
        assert_eq!(first_gating_violation(&steps), Some(step(4)));
        assert_eq!(first_gating_violation(&completed_through(5)), None);
    }
}
