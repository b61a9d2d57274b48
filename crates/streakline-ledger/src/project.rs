//! View projections.
//!
//! Pure, stateless functions over ledger rows. No side effects; the same
//! inputs always produce the same output, so repeated renders are stable.

use streakline_model::{MemberId, MonthWindow};

use crate::store::MemberRow;

/// How to order rows for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMode {
    /// Keep existing order, pin the viewer's own row to the top.
    SelfPinned,
    /// Sort by total completed days, descending.
    Ranked,
}

/// Count of completed days in a row.
pub fn completed_count(days: &[bool]) -> usize {
    days.iter().filter(|&&d| d).count()
}

/// Length of the streak ending at today.
///
/// Counts the contiguous run of completed days finishing at `today_index`.
/// A day that is not yet completed has no active streak: yesterday's run
/// does not count until today is logged.
pub fn streak(days: &[bool], today_index: usize) -> usize {
    match days.get(today_index) {
        Some(true) => {}
        _ => return 0,
    }
    let mut count = 1;
    let mut idx = today_index;
    while idx > 0 && days[idx - 1] {
        count += 1;
        idx -= 1;
    }
    count
}

/// Order rows for display.
///
/// `SelfPinned` is stable: existing order is preserved except the viewer
/// moves to index 0. `Ranked` sorts by completed-day count descending,
/// ties broken by case-insensitive display name, then by member id so the
/// order is total and reproducible across re-renders.
pub fn order<'a>(rows: &'a [MemberRow], viewer: &MemberId, mode: RankingMode) -> Vec<&'a MemberRow> {
    let mut ordered: Vec<&MemberRow> = rows.iter().collect();
    match mode {
        RankingMode::SelfPinned => {
            if let Some(idx) = ordered.iter().position(|r| &r.member_id == viewer) {
                if idx > 0 {
                    let me = ordered.remove(idx);
                    ordered.insert(0, me);
                }
            }
        }
        RankingMode::Ranked => {
            ordered.sort_by(|a, b| {
                completed_count(&b.days)
                    .cmp(&completed_count(&a.days))
                    .then_with(|| {
                        a.display_name
                            .to_lowercase()
                            .cmp(&b.display_name.to_lowercase())
                    })
                    .then_with(|| a.member_id.cmp(&b.member_id))
            });
        }
    }
    ordered
}

/// Whether `viewer` may toggle `day_index` on `owner`'s row.
///
/// Only the row's own member may edit, and only inside the two-day window.
pub fn can_edit(viewer: &MemberId, owner: &MemberId, day_index: usize, window: &MonthWindow) -> bool {
    viewer == owner && window.is_editable(day_index)
}
