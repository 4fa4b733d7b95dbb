//! Championship points allocation.

/// Points awarded per finishing position.
///
/// Positions outside the scoring window and unclassified entries score zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsTable {
    awards: Vec<(u32, u32)>,
}

impl Default for PointsTable {
    /// The standard FIA table: 25-18-15-12-10-8-6-4-2-1 for P1 through P10.
    fn default() -> Self {
        Self {
            awards: vec![
                (1, 25),
                (2, 18),
                (3, 15),
                (4, 12),
                (5, 10),
                (6, 8),
                (7, 6),
                (8, 4),
                (9, 2),
                (10, 1),
            ],
        }
    }
}

impl PointsTable {
    /// Highest points a single race can pay out under this table, plus the
    /// one-point fastest-lap allowance. Used as the normalization ceiling for
    /// points efficiency.
    pub fn max_single_race(&self) -> f64 {
        let best = self
            .awards
            .iter()
            .map(|&(_, points)| points)
            .max()
            .unwrap_or(0);
        f64::from(best) + 1.0
    }

    /// Points for a finishing position; zero for unranked or absent positions.
    pub fn points_for(&self, position: Option<u32>) -> u32 {
        let Some(position) = position else {
            return 0;
        };
        self.awards
            .iter()
            .find(|&&(slot, _)| slot == position)
            .map(|&(_, points)| points)
            .unwrap_or(0)
    }
}
