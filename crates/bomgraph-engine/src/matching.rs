//! Approximate alignment of token sequences.

use std::cmp::Ordering;

/// Levenshtein distance over whole tokens. Insertion, deletion, and
/// substitution each cost one.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, left) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, right) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(left != right);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Greedily pair `src` sequences with `dst` sequences by edit distance.
///
/// Both sides are ordered by `(length, dotted join)`. Each sequence on the
/// shorter side claims the nearest unclaimed sequence on the other side;
/// ties go to the earlier candidate in that order. Returns `(src, dst)`
/// index pairs into the original slices.
pub fn greedy_match(src: &[Vec<String>], dst: &[Vec<String>]) -> Vec<(usize, usize)> {
    if dst.len() < src.len() {
        return claim(dst, src)
            .into_iter()
            .map(|(d, s)| (s, d))
            .collect();
    }
    claim(src, dst)
}

fn claim(iterate: &[Vec<String>], pool: &[Vec<String>]) -> Vec<(usize, usize)> {
    let iterate_order = sorted_order(iterate);
    let pool_order = sorted_order(pool);
    let mut used = vec![false; pool.len()];
    let mut pairs = Vec::new();

    for i in iterate_order {
        let mut best: Option<(usize, usize)> = None;
        for &j in &pool_order {
            if used[j] {
                continue;
            }
            let distance = edit_distance(&iterate[i], &pool[j]);
            if best.is_none_or(|(_, min)| distance < min) {
                best = Some((j, distance));
            }
        }
        if let Some((j, _)) = best {
            used[j] = true;
            pairs.push((i, j));
        }
    }
    pairs
}

fn sorted_order(sequences: &[Vec<String>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sequences.len()).collect();
    order.sort_by(|&a, &b| compare_tokens(&sequences[a], &sequences[b]));
    order
}

fn compare_tokens(a: &[String], b: &[String]) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.join(".").cmp(&b.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(dotted: &str) -> Vec<String> {
        dotted.split('.').map(str::to_string).collect()
    }

    #[test]
    fn edit_distance_counts_token_edits() {
        let cases = [
            ("piece.bishop", "piece.bishop", 0),
            ("piece.bishop", "piece.knight", 1),
            ("piece.bishop", "bishop.piece", 2),
            ("piece.bishop", "piece", 1),
            ("piece", "piece.bishop", 1),
            ("pawn", "queen", 1),
            ("rook", "knight", 1),
            ("piece.bishop.extra", "piece.bishop", 1),
            ("a.b.c", "a.b.c.d.e", 2),
        ];
        for (a, b, want) in cases {
            assert_eq!(edit_distance(&tokens(a), &tokens(b)), want, "{a} vs {b}");
        }
    }

    #[test]
    fn edit_distance_handles_empty_sides() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(edit_distance(&empty, &empty), 0);
        assert_eq!(edit_distance(&empty, &tokens("a.b")), 2);
        assert_eq!(edit_distance(&tokens("a.b.c"), &empty), 3);
    }

    #[test]
    fn greedy_match_pairs_nearest_sequences() {
        let src = vec![tokens("bike.chassis"), tokens("bike.wheel")];
        let dst = vec![tokens("bike.wheel"), tokens("bike.frame")];
        let mut pairs = greedy_match(&src, &dst);
        pairs.sort();
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn greedy_match_iterates_shorter_side() {
        let src = vec![tokens("a.x"), tokens("a.y"), tokens("b.z.w")];
        let dst = vec![tokens("b.z.q")];
        assert_eq!(greedy_match(&src, &dst), vec![(2, 0)]);
    }

    #[test]
    fn greedy_match_breaks_ties_by_sorted_order() {
        let src = vec![tokens("m.q")];
        let dst = vec![tokens("z.q"), tokens("k.q")];
        assert_eq!(greedy_match(&src, &dst), vec![(0, 1)]);
    }

    #[test]
    fn greedy_match_with_empty_side_is_empty() {
        assert!(greedy_match(&[], &[tokens("a")]).is_empty());
        assert!(greedy_match(&[tokens("a")], &[]).is_empty());
    }
}
