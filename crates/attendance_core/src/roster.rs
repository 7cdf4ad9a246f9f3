use std::collections::HashSet;

use shared::domain::{Person, StudentId};

use crate::error::WorkflowError;

/// In-memory roster for one session. Built from an external roster source at
/// session start; the workflow only ever flips the per-person flags.
///
/// Marks are tracked separately from the `present` flags so that a round
/// where nobody was touched is distinguishable from a round where everyone
/// was explicitly marked absent.
#[derive(Debug, Default)]
pub struct RosterStore {
    people: Vec<Person>,
    marked_this_round: HashSet<StudentId>,
}

impl RosterStore {
    pub fn new(people: Vec<Person>) -> Self {
        Self {
            people,
            marked_this_round: HashSet::new(),
        }
    }

    /// Stable insertion order, the order the roster source supplied.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn get(&self, id: &StudentId) -> Option<&Person> {
        self.people.iter().find(|person| &person.id == id)
    }

    pub fn set_present(&mut self, id: &StudentId, value: bool) -> Result<(), WorkflowError> {
        self.person_mut(id)?.present = value;
        self.marked_this_round.insert(id.clone());
        Ok(())
    }

    pub fn set_registered(&mut self, id: &StudentId, value: bool) -> Result<(), WorkflowError> {
        self.person_mut(id)?.registered = value;
        Ok(())
    }

    /// Clears every presence flag and the round's marks. Called once before
    /// a new attendance round begins.
    pub fn reset_presence(&mut self) {
        for person in &mut self.people {
            person.present = false;
        }
        self.marked_this_round.clear();
    }

    pub fn any_marked(&self) -> bool {
        !self.marked_this_round.is_empty()
    }

    fn person_mut(&mut self, id: &StudentId) -> Result<&mut Person, WorkflowError> {
        self.people
            .iter_mut()
            .find(|person| &person.id == id)
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> RosterStore {
        RosterStore::new(vec![
            Person::new(StudentId::new("S001"), "John Doe"),
            Person::new(StudentId::new("S002"), "Jane Smith"),
        ])
    }

    #[test]
    fn set_present_rejects_unknown_id() {
        let mut store = roster();
        let err = store
            .set_present(&StudentId::new("S999"), true)
            .expect_err("unknown id");
        assert_eq!(err, WorkflowError::NotFound(StudentId::new("S999")));
        assert!(!store.any_marked());
    }

    #[test]
    fn marking_is_idempotent_and_tracked_per_round() {
        let mut store = roster();
        let id = StudentId::new("S001");
        store.set_present(&id, true).expect("mark");
        store.set_present(&id, true).expect("mark again");
        assert!(store.get(&id).expect("person").present);
        assert!(store.any_marked());

        store.reset_presence();
        assert!(!store.get(&id).expect("person").present);
        assert!(!store.any_marked());
    }

    #[test]
    fn registration_flag_survives_presence_reset() {
        let mut store = roster();
        let id = StudentId::new("S002");
        store.set_registered(&id, true).expect("register");
        store.reset_presence();
        assert!(store.get(&id).expect("person").registered);
    }
}
