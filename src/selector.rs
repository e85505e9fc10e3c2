use std::num::NonZeroU64;

use rand::Rng;

/// Last block of every epoch in `[start, end)`, ascending.
pub fn checkpoint_blocks(start: u64, end: u64, epoch: NonZeroU64) -> Vec<u64> {
    let epoch = epoch.get();
    (start..end).filter(|b| b % epoch == epoch - 1).collect()
}

/// `count` distinct blocks drawn uniformly from `[start, end]`, ascending.
///
/// After sorting, every element whose *position* satisfies
/// `i % epoch == epoch - 1` is removed. The filter looks at the index in the
/// sorted sample, not at the block number, so the result may still contain
/// epoch boundary blocks and is shorter than `count` once `count >= epoch`.
///
/// A `count` larger than the range is clamped to the range size.
pub fn random_blocks<R>(
    start: u64,
    end: u64,
    count: u64,
    epoch: NonZeroU64,
    rng: &mut R,
) -> Vec<u64>
where
    R: Rng + ?Sized,
{
    if end < start {
        return Vec::new();
    }
    let span = usize::try_from(end - start)
        .ok()
        .and_then(|n| n.checked_add(1))
        .unwrap_or(usize::MAX);
    let amount = usize::try_from(count).unwrap_or(usize::MAX).min(span);

    let mut picked: Vec<u64> = rand::seq::index::sample(rng, span, amount)
        .into_iter()
        .map(|offset| start + offset as u64)
        .collect();
    picked.sort_unstable();

    let epoch = usize::try_from(epoch.get()).unwrap_or(usize::MAX);
    picked
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % epoch != epoch - 1)
        .map(|(_, block)| block)
        .collect()
}
