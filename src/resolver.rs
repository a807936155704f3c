//! Per-row conflict resolution: which response is chosen, which is rejected.

use crate::row::Row;

/// Score a response must carry to count as correct when a row has no pairs.
pub const CORRECT_SCORE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preference<'r> {
    pub chosen: &'r str,
    pub rejected: &'r str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'r> {
    /// One entry per informative conflict pair, in pair order.
    Pairs(Vec<Preference<'r>>),
    /// Per-response labels, used when the row has no conflict pairs.
    Labels {
        chosen: Vec<&'r str>,
        rejected: Vec<&'r str>,
    },
}

impl Resolution<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Pairs(p) => p.is_empty(),
            Self::Labels { chosen, rejected } => chosen.is_empty() && rejected.is_empty(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    pub ties: usize,
    pub out_of_range: usize,
}

impl std::ops::AddAssign for ResolveStats {
    fn add_assign(&mut self, rhs: Self) {
        self.ties += rhs.ties;
        self.out_of_range += rhs.out_of_range;
    }
}

pub fn resolve(row: &Row) -> (Resolution<'_>, ResolveStats) {
    match &row.conflict_pairs {
        Some(pairs) => {
            let (prefs, stats) = resolve_pairs(&row.responses, &row.scores, pairs);
            (Resolution::Pairs(prefs), stats)
        }
        None => {
            let (chosen, rejected, stats) = label_by_score(&row.responses, &row.scores);
            (Resolution::Labels { chosen, rejected }, stats)
        }
    }
}

/// Strictly higher score wins. Ties and out-of-range indices emit nothing.
pub fn resolve_pairs<'r>(
    responses: &'r [String],
    scores: &[f64],
    pairs: &[(usize, usize)],
) -> (Vec<Preference<'r>>, ResolveStats) {
    let mut out = Vec::with_capacity(pairs.len());
    let mut stats = ResolveStats::default();

    for &(i, j) in pairs {
        let (Some(ri), Some(rj), Some(&si), Some(&sj)) =
            (responses.get(i), responses.get(j), scores.get(i), scores.get(j))
        else {
            stats.out_of_range += 1;
            continue;
        };

        if si > sj {
            out.push(Preference { chosen: ri, rejected: rj });
        } else if sj > si {
            out.push(Preference { chosen: rj, rejected: ri });
        } else {
            // equal, or NaN on either side
            stats.ties += 1;
        }
    }
    (out, stats)
}

pub fn label_by_score<'r>(
    responses: &'r [String],
    scores: &[f64],
) -> (Vec<&'r str>, Vec<&'r str>, ResolveStats) {
    let mut chosen = Vec::new();
    let mut rejected = Vec::new();
    let mut stats = ResolveStats::default();

    for (k, response) in responses.iter().enumerate() {
        match scores.get(k) {
            Some(&s) if s == CORRECT_SCORE => chosen.push(response.as_str()),
            Some(_) => rejected.push(response.as_str()),
            None => stats.out_of_range += 1,
        }
    }
    (chosen, rejected, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn higher_score_is_chosen() {
        let responses = strs(&["A", "B"]);
        let (prefs, stats) = resolve_pairs(&responses, &[1.0, 0.0], &[(0, 1)]);
        assert_eq!(prefs, vec![Preference { chosen: "A", rejected: "B" }]);
        assert_eq!(stats, ResolveStats::default());

        // order inside the pair does not matter
        let (prefs, _) = resolve_pairs(&responses, &[0.0, 1.0], &[(0, 1)]);
        assert_eq!(prefs, vec![Preference { chosen: "B", rejected: "A" }]);
    }

    #[test]
    fn ties_are_skipped() {
        let responses = strs(&["A", "B"]);
        let (prefs, stats) = resolve_pairs(&responses, &[1.0, 1.0], &[(0, 1)]);
        assert!(prefs.is_empty());
        assert_eq!(stats.ties, 1);

        let (prefs, stats) = resolve_pairs(&responses, &[f64::NAN, 0.0], &[(0, 1)]);
        assert!(prefs.is_empty());
        assert_eq!(stats.ties, 1);
    }

    #[test]
    fn out_of_range_pair_does_not_stop_the_rest() {
        let responses = strs(&["A", "B", "C"]);
        let scores = [0.0, 1.0, 0.0];
        let (prefs, stats) = resolve_pairs(&responses, &scores, &[(0, 5), (2, 1), (7, 8)]);
        assert_eq!(prefs, vec![Preference { chosen: "B", rejected: "C" }]);
        assert_eq!(stats.out_of_range, 2);
    }

    #[test]
    fn short_scores_count_as_out_of_range() {
        let responses = strs(&["A", "B", "C"]);
        let (prefs, stats) = resolve_pairs(&responses, &[1.0, 0.0], &[(0, 2), (0, 1)]);
        assert_eq!(prefs, vec![Preference { chosen: "A", rejected: "B" }]);
        assert_eq!(stats.out_of_range, 1);
    }

    #[test]
    fn chosen_score_always_strictly_greater() {
        let responses = strs(&["a", "b", "c", "d"]);
        let scores = [0.25, 1.0, 0.25, 0.0];
        let pairs: Vec<_> = (0..4)
            .flat_map(|i| (0..4).map(move |j| (i, j)))
            .collect();
        let (prefs, stats) = resolve_pairs(&responses, &scores, &pairs);

        let score_of = |s: &str| scores[responses.iter().position(|r| r == s).unwrap()];
        for p in &prefs {
            assert!(score_of(p.chosen) > score_of(p.rejected));
        }
        // 4 self pairs plus (0,2) and (2,0)
        assert_eq!(stats.ties, 6);
        assert_eq!(prefs.len(), 10);
    }

    #[test]
    fn labels_without_pairs() {
        let responses = strs(&["A", "B", "C", "D"]);
        let (chosen, rejected, stats) = label_by_score(&responses, &[1.0, 0.0, 0.5]);
        assert_eq!(chosen, vec!["A"]);
        assert_eq!(rejected, vec!["B", "C"]);
        assert_eq!(stats.out_of_range, 1);
    }

    #[test]
    fn resolve_dispatches_on_pair_presence() {
        let row = Row {
            prompt: "p".into(),
            responses: strs(&["A", "B"]),
            scores: vec![1.0, 0.0],
            conflict_pairs: None,
            question_id: None,
            malformed_pairs: 0,
        };
        let (res, _) = resolve(&row);
        assert_eq!(
            res,
            Resolution::Labels { chosen: vec!["A"], rejected: vec!["B"] }
        );

        let row = Row { conflict_pairs: Some(vec![]), ..row };
        let (res, _) = resolve(&row);
        assert!(res.is_empty());
        assert_eq!(res, Resolution::Pairs(vec![]));
    }
}
