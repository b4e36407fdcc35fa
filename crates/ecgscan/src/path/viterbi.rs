use super::{CandidateTable, FallbackReason, PathConfig};

const NO_PARENT: usize = usize::MAX;

/// Minimum-cost left-to-right path through `table`.
///
/// The transition from candidate `i` of column `x-1` to candidate `j` of
/// column `x` costs `jump_weight * |dy| + step_cost` and is forbidden when
/// `|dy| > max_jump`. Ties keep the lowest slot index. Returns one relative
/// row per column.
pub fn solve_viterbi(table: &CandidateTable, config: &PathConfig) -> Result<Vec<f64>, FallbackReason> {
    let width = table.width();
    if width == 0 {
        return Ok(Vec::new());
    }
    let stride = table.stride();

    let mut cost = vec![f64::INFINITY; width * stride];
    let mut parent = vec![NO_PARENT; width * stride];

    let first = table.column(0);
    if first.iter().any(|y| !y.is_finite()) {
        return Err(FallbackReason::NonFinite { column: 0 });
    }
    cost[..first.len()].fill(0.0);

    for x in 1..width {
        let prev = table.column(x - 1);
        let cur = table.column(x);
        let (done, rest) = cost.split_at_mut(x * stride);
        let prev_cost = &done[(x - 1) * stride..(x - 1) * stride + prev.len()];
        let cur_cost = &mut rest[..stride];
        let mut reachable = false;

        for (j, &yj) in cur.iter().enumerate() {
            if !yj.is_finite() {
                return Err(FallbackReason::NonFinite { column: x });
            }
            let mut best = f64::INFINITY;
            let mut best_i = NO_PARENT;
            for (i, (&yi, &ci)) in prev.iter().zip(prev_cost.iter()).enumerate() {
                if !ci.is_finite() {
                    continue;
                }
                let dy = (yj - yi).abs();
                if dy > config.max_jump {
                    continue;
                }
                let c = ci + config.jump_weight * dy + config.step_cost;
                if c < best {
                    best = c;
                    best_i = i;
                }
            }
            if best_i != NO_PARENT {
                if !best.is_finite() {
                    return Err(FallbackReason::NonFinite { column: x });
                }
                cur_cost[j] = best;
                parent[x * stride + j] = best_i;
                reachable = true;
            }
        }

        if !reachable {
            return Err(FallbackReason::Unreachable { column: x });
        }
    }

    let last = width - 1;
    let mut slot = 0;
    let mut best = f64::INFINITY;
    for (j, &c) in cost[last * stride..last * stride + table.column(last).len()]
        .iter()
        .enumerate()
    {
        if c < best {
            best = c;
            slot = j;
        }
    }

    let mut rows = vec![0.0; width];
    for x in (0..width).rev() {
        rows[x] = table.column(x)[slot];
        if x > 0 {
            slot = parent[x * stride + slot];
        }
    }
    tracing::trace!(total_cost = best, "viterbi path found");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::TraceMask;
    use crate::path::build_candidates;
    use crate::region::Region;
    use crate::test_utils::mask_from_rows;

    fn solve(mask: &TraceMask) -> Result<Vec<f64>, FallbackReason> {
        let region = Region::new(0, mask.height());
        let config = PathConfig::default();
        solve_viterbi(&build_candidates(mask, region, &config), &config)
    }

    #[test]
    fn follows_smallest_jumps() {
        // A full-width line and a distractor that ends early; leaving the
        // distractor costs a jump so the full line wins.
        let mask = TraceMask::from_fn(50, 100, |x, y| y == 20 || (y == 45 && x < 25));
        let rows = solve(&mask).unwrap();
        assert!(rows.iter().all(|&y| y == 20.0));
    }

    #[test]
    fn equal_costs_keep_the_topmost_candidate() {
        // Symmetric split: 10 and 30 are both 10 rows from 20.
        let mut rows = vec![Some(20)];
        rows.push(None);
        let mut mask = mask_from_rows(2, 40, &rows);
        mask.set(1, 10, true);
        mask.set(1, 30, true);
        assert_eq!(solve(&mask).unwrap(), vec![20.0, 10.0]);
    }

    #[test]
    fn jump_larger_than_limit_is_unreachable() {
        let mask = mask_from_rows(4, 100, &[Some(5), Some(5), Some(80), Some(80)]);
        assert_eq!(solve(&mask), Err(FallbackReason::Unreachable { column: 2 }));
    }

    #[test]
    fn jump_at_limit_is_allowed() {
        let mask = mask_from_rows(3, 100, &[Some(10), Some(40), Some(40)]);
        assert_eq!(solve(&mask).unwrap(), vec![10.0, 40.0, 40.0]);
    }
}
