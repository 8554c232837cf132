use log::{debug, warn};

use crate::filter::{filter_residents, visit_stats, VisitStats};
use crate::reconcile::reconcile;
use crate::resident::{is_known_category, Resident};

/// A change made by the volunteer to one resident.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Edit {
    Phone(String),
    Category(String),
    Remark(String),
    /// One more visit.
    Visit,
    /// One visit less. Does nothing at zero.
    Unvisit,
}

impl Edit {
    fn apply_to(&self, r: &mut Resident) {
        match self {
            Edit::Phone(p) => r.phone_number = p.clone(),
            Edit::Category(c) => {
                if !c.is_empty() && !is_known_category(c) {
                    warn!("resident {}: unknown category {:?}", r.id, c);
                }
                r.category = c.clone()
            }
            Edit::Remark(s) => r.remark = s.clone(),
            Edit::Visit => r.visit_count = r.visit_count.saturating_add(1),
            Edit::Unvisit => r.visit_count = r.visit_count.saturating_sub(1),
        }
    }
}

/// The list of residents held by one volunteer.
///
/// Residents are addressed by their client-side id.
///
/// ```
/// use canvass_core::{Edit, Resident, Roster};
///
/// let mut roster = Roster::new(vec![Resident {
///     id: "r1".to_string(),
///     name: "Anna".to_string(),
///     ..Resident::default()
/// }]);
/// roster.apply("r1", &Edit::Visit);
/// assert_eq!(roster.stats().total_visits, 1);
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Roster {
    residents: Vec<Resident>,
}

impl Roster {
    pub fn new(residents: Vec<Resident>) -> Roster {
        Roster { residents }
    }

    pub fn residents(&self) -> &[Resident] {
        &self.residents
    }

    pub fn len(&self) -> usize {
        self.residents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residents.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Resident> {
        self.residents.iter().find(|r| r.id == id)
    }

    /// Applies an edit to the resident with the given id.
    ///
    /// Returns the updated resident, which the caller is expected to write through
    /// to the backing table, or `None` if there is no such resident.
    pub fn apply(&mut self, id: &str, edit: &Edit) -> Option<&Resident> {
        let r = self.residents.iter_mut().find(|r| r.id == id)?;
        edit.apply_to(r);
        debug!("apply: {} {:?} -> visits {}", id, edit, r.visit_count);
        Some(&*r)
    }

    /// Replaces the whole list.
    pub fn replace(&mut self, residents: Vec<Resident>) {
        self.residents = residents;
    }

    /// Merges a fresh snapshot of the backing table into this list.
    pub fn merge_remote(&mut self, remote: Vec<Resident>) {
        let local = std::mem::take(&mut self.residents);
        self.residents = reconcile(&local, remote);
    }

    pub fn clear(&mut self) {
        self.residents.clear();
    }

    pub fn view(&self, query: &str, visited_only: bool) -> Vec<&Resident> {
        filter_residents(&self.residents, query, visited_only)
    }

    pub fn stats(&self) -> VisitStats {
        visit_stats(&self.residents)
    }
}
