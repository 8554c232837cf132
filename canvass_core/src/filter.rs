use crate::resident::Resident;

/// Derives the displayed list from the full list.
///
/// The visited-only filter applies first, then the text query. The query is
/// matched case-insensitively as a substring of the name, the guardian's name,
/// the ward/house number or the house name. A query made only of whitespace
/// does not filter anything. The input order is preserved.
pub fn filter_residents<'a>(
    residents: &'a [Resident],
    query: &str,
    visited_only: bool,
) -> Vec<&'a Resident> {
    let needle = if query.trim().is_empty() {
        None
    } else {
        Some(query.to_lowercase())
    };
    residents
        .iter()
        .filter(|r| !visited_only || r.is_visited())
        .filter(|r| match &needle {
            Some(q) => matches_query(r, q),
            None => true,
        })
        .collect()
}

// `q` is already lowercased.
fn matches_query(r: &Resident, q: &str) -> bool {
    [&r.name, &r.guardian_name, &r.ward_house_no, &r.house_name]
        .iter()
        .any(|field| field.to_lowercase().contains(q))
}

/// Visit statistics over a list of residents.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct VisitStats {
    pub total: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub total_visits: u64,
}

pub fn visit_stats(residents: &[Resident]) -> VisitStats {
    let total = residents.len();
    let visited = residents.iter().filter(|r| r.is_visited()).count();
    VisitStats {
        total,
        visited,
        unvisited: total - visited,
        total_visits: residents.iter().map(|r| r.visit_count as u64).sum(),
    }
}
