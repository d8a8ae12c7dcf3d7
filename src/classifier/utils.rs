/// Softmax over raw logits. Shifted by the max logit for numerical
/// stability before exponentiation.
pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|x| x / sum).collect()
}

/// Index of the maximum value, first occurrence winning on ties.
///
/// Implemented as an explicit single-pass scan with a strictly-greater
/// comparison so the tie-break is guaranteed rather than inherited from a
/// library max routine.
pub(crate) fn argmax_first(values: &[f32]) -> Option<usize> {
    if values.is_empty() {
        return None;
    }
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_argmax_first_occurrence_wins() {
        assert_eq!(argmax_first(&[0.3, 0.3, 0.2, 0.2]), Some(0));
        assert_eq!(argmax_first(&[0.1, 0.5, 0.5]), Some(1));
        assert_eq!(argmax_first(&[]), None);
    }
}
