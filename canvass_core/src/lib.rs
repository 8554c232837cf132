//! Core logic for door-to-door canvassing lists.
//!
//! A list of [`Resident`]s is imported from a spreadsheet, edited by a volunteer
//! (visits, phone numbers, categories, remarks) and mirrored to a remote table
//! with a fixed eleven-column layout. This crate holds the parts that do not
//! perform any I/O:
//!
//! - [`codec`] maps table rows to residents and back
//! - [`reconcile`](reconcile::reconcile) merges a remote snapshot with local edits
//! - [`filter`] derives the searchable view and the visit statistics
//! - [`Roster`] holds the list and applies the edits

pub mod codec;
pub mod filter;
pub mod reconcile;
mod resident;
mod roster;

pub use crate::codec::{Cell, HeaderRow};
pub use crate::filter::{filter_residents, visit_stats, VisitStats};
pub use crate::reconcile::reconcile;
pub use crate::resident::*;
pub use crate::roster::{Edit, Roster};
