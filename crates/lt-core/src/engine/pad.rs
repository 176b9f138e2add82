//! Row padding for flat matrices.

/// Row lengths observed on a channel that needed padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadReport {
    pub min: usize,
    pub max: usize,
    /// Rows that were extended.
    pub padded: usize,
}

/// Right-pad every row with zeros to the longest row's length.
///
/// Returns `None` when all rows already have the same length.
pub fn pad_rows(rows: &mut [Vec<f64>]) -> Option<PadReport> {
    let min = rows.iter().map(Vec::len).min()?;
    let max = rows.iter().map(Vec::len).max()?;
    if min == max {
        return None;
    }

    let mut padded = 0;
    for row in rows.iter_mut().filter(|r| r.len() < max) {
        row.resize(max, 0.0);
        padded += 1;
    }
    Some(PadReport { min, max, padded })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_shorter_rows_with_trailing_zeros() {
        let mut rows = vec![vec![1.0; 3], vec![2.0; 5], vec![3.0; 4]];
        let report = pad_rows(&mut rows).unwrap();
        assert_eq!(report, PadReport { min: 3, max: 5, padded: 2 });
        assert!(rows.iter().all(|r| r.len() == 5));
        assert_eq!(rows[0], vec![1.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(rows[2], vec![3.0, 3.0, 3.0, 3.0, 0.0]);
        assert_eq!(rows[1], vec![2.0; 5]);
    }

    #[test]
    fn uniform_rows_untouched() {
        let mut rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(pad_rows(&mut rows), None);
        assert_eq!(pad_rows(&mut []), None);
    }
}
