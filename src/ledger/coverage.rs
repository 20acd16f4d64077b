use crate::core::period::DateRange;

/// Sub-intervals of `window` that no range in `coverage` touches.
///
/// Gaps come back sorted and non-overlapping. Adjacent coverage ranges
/// (one ending the day before the next starts) leave no gap.
pub fn find_gaps(window: DateRange, coverage: &[DateRange]) -> Vec<DateRange> {
    let mut ranges: Vec<DateRange> = coverage
        .iter()
        .filter_map(|r| r.intersection(&window))
        .collect();
    ranges.sort();

    let mut gaps = Vec::new();
    // First day not yet known to be covered; None once past the window.
    let mut cursor = Some(window.start());

    for range in ranges {
        let Some(next) = cursor else { break };
        if range.start() > next {
            if let Some(gap_end) = range.start().pred_opt() {
                if let Ok(gap) = DateRange::new(next, gap_end) {
                    gaps.push(gap);
                }
            }
        }
        if range.end() >= next {
            cursor = if range.end() >= window.end() {
                None
            } else {
                range.end().succ_opt()
            };
        }
    }

    if let Some(next) = cursor {
        if let Ok(gap) = DateRange::new(next, window.end()) {
            gaps.push(gap);
        }
    }
    gaps
}

/// The smallest range containing every one of `ranges`.
pub fn hull(ranges: &[DateRange]) -> Option<DateRange> {
    let (first, rest) = ranges.split_first()?;
    Some(rest.iter().fold(*first, |acc, r| acc.hull(r)))
}
