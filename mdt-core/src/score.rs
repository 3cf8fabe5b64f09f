use std::fmt::Debug;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Every task variant scores exactly four conditions.
pub const CONDITION_COUNT: usize = 4;

/// A scored trial type of one task variant.
pub trait Condition: Copy + Eq + Debug + Send + Sync + 'static {
    /// All conditions in score-table order.
    const ALL: [Self; CONDITION_COUNT];

    /// Position in the score table, `0..CONDITION_COUNT`.
    fn index(self) -> usize;

    /// Label used in the log summary.
    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCell {
    pub correct: u32,
    pub incorrect: u32,
    pub responses: u32,
}

impl ScoreCell {
    /// `(correct, incorrect)` as fractions of responses; `(0.0, 0.0)` when
    /// there were none.
    pub fn ratios(&self) -> (f64, f64) {
        if self.responses == 0 {
            return (0.0, 0.0);
        }
        let responses = f64::from(self.responses);
        (
            f64::from(self.correct) / responses,
            f64::from(self.incorrect) / responses,
        )
    }
}

/// Per-condition response tallies for one session.
#[derive(Debug, Clone)]
pub struct Scorer<C: Condition> {
    cells: [ScoreCell; CONDITION_COUNT],
    _marker: PhantomData<C>,
}

impl<C: Condition> Default for Scorer<C> {
    fn default() -> Self {
        Self {
            cells: [ScoreCell::default(); CONDITION_COUNT],
            _marker: PhantomData,
        }
    }
}

impl<C: Condition> Scorer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tallies one test response. Timeouts (`None`) are not counted at all.
    pub fn record(&mut self, condition: C, response: Option<&str>, expected: &str) {
        let Some(response) = response else {
            return;
        };
        let cell = &mut self.cells[condition.index()];
        cell.responses += 1;
        if response == expected {
            cell.correct += 1;
        } else {
            cell.incorrect += 1;
        }
    }

    pub fn cell(&self, condition: C) -> ScoreCell {
        self.cells[condition.index()]
    }

    /// Cells in score-table order.
    pub fn cells(&self) -> [(C, ScoreCell); CONDITION_COUNT] {
        C::ALL.map(|c| (c, self.cell(c)))
    }

    pub fn ratios(&self) -> [(C, (f64, f64)); CONDITION_COUNT] {
        C::ALL.map(|c| (c, self.cell(c).ratios()))
    }

    pub fn total_responses(&self) -> u32 {
        self.cells.iter().map(|c| c.responses).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        A,
        B,
        C,
        D,
    }

    impl Condition for Kind {
        const ALL: [Self; CONDITION_COUNT] = [Kind::A, Kind::B, Kind::C, Kind::D];

        fn index(self) -> usize {
            self as usize
        }

        fn label(self) -> &'static str {
            match self {
                Kind::A => "A",
                Kind::B => "B",
                Kind::C => "C",
                Kind::D => "D",
            }
        }
    }

    #[test]
    fn zero_responses_give_zero_ratios() {
        let scorer = Scorer::<Kind>::new();
        for (_, ratios) in scorer.ratios() {
            assert_eq!(ratios, (0.0, 0.0));
        }
    }

    #[test]
    fn three_of_four_correct() {
        let mut scorer = Scorer::new();
        for response in ["z", "z", "z", "m"] {
            scorer.record(Kind::B, Some(response), "z");
        }
        assert_eq!(
            scorer.cell(Kind::B),
            ScoreCell {
                correct: 3,
                incorrect: 1,
                responses: 4
            }
        );
        assert_eq!(scorer.ratios()[1], (Kind::B, (0.75, 0.25)));
        assert_eq!(scorer.cell(Kind::A), ScoreCell::default());
    }

    #[test]
    fn timeouts_are_ignored() {
        let mut scorer = Scorer::new();
        scorer.record(Kind::D, None, "m");
        scorer.record(Kind::D, None, "z");
        assert_eq!(scorer.cell(Kind::D).responses, 0);
        assert_eq!(scorer.total_responses(), 0);
    }

    #[test]
    fn cells_follow_table_order() {
        let mut scorer = Scorer::new();
        scorer.record(Kind::C, Some("m"), "m");
        let labels: Vec<_> = scorer.cells().iter().map(|(c, _)| c.label()).collect();
        assert_eq!(labels, ["A", "B", "C", "D"]);
        assert_eq!(scorer.cells()[2].1.correct, 1);
    }
}
