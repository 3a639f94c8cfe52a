use serde::Serialize;

use super::domain::Project;

/// How much of the team × criterion grid judges have filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub filled: usize,
    pub total_cells: usize,
    pub percent: u8,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.total_cells > 0 && self.filled == self.total_cells
    }
}

/// Counts explicit entries, so a stored zero is filled and a missing key is not.
/// Entries for deleted criteria are not counted.
pub fn progress(project: &Project) -> Progress {
    let total_cells = project.teams.len() * project.criteria.len();
    let filled = project
        .teams
        .iter()
        .map(|team| {
            project
                .criteria
                .iter()
                .filter(|criterion| team.has_score(&criterion.id))
                .count()
        })
        .sum::<usize>();

    let percent = if total_cells == 0 {
        0
    } else {
        let ratio = (filled as f64 / total_cells as f64 * 100.0).round();
        ratio.clamp(0.0, 100.0) as u8
    };

    Progress {
        filled,
        total_cells,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::domain::{Criterion, CriterionId, Team};

    fn project(teams: usize, criteria: usize) -> Project {
        let mut project = Project::from_template("Progress", 0);
        project.criteria = (0..criteria)
            .map(|index| Criterion::new(format!("C{index}"), 10.0, 10.0))
            .collect();
        project.teams = (0..teams).map(|index| Team::new(format!("T{index}"))).collect();
        project
    }

    #[test]
    fn explicit_zero_counts_as_filled() {
        let mut project = project(2, 3);
        let ids: Vec<CriterionId> = project.criteria.iter().map(|c| c.id.clone()).collect();
        project.teams[0].scores.insert(ids[0].clone(), 8.0);
        project.teams[0].scores.insert(ids[1].clone(), 0.0);
        project.teams[0].scores.insert(ids[2].clone(), 4.0);
        project.teams[1].scores.insert(ids[0].clone(), 6.0);

        let progress = progress(&project);
        assert_eq!(
            progress,
            Progress {
                filled: 4,
                total_cells: 6,
                percent: 67,
            }
        );
        assert!(!progress.is_complete());
    }

    #[test]
    fn empty_grid_reports_zero_percent() {
        assert_eq!(progress(&project(0, 6)).percent, 0);
        assert_eq!(progress(&project(3, 0)).percent, 0);
        assert_eq!(progress(&project(0, 0)).total_cells, 0);
    }

    #[test]
    fn stale_entries_do_not_inflate_progress() {
        let mut project = project(1, 1);
        let id = project.criteria[0].id.clone();
        project.teams[0].scores.insert(id, 5.0);
        project.teams[0]
            .scores
            .insert(CriterionId("deleted".to_string()), 9.0);

        let progress = progress(&project);
        assert_eq!(progress.filled, 1);
        assert_eq!(progress.percent, 100);
        assert!(progress.is_complete());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let value = serde_json::to_value(Progress {
            filled: 4,
            total_cells: 6,
            percent: 67,
        })
        .expect("serializes");
        assert_eq!(
            value,
            serde_json::json!({ "filled": 4, "totalCells": 6, "percent": 67 })
        );
    }
}
