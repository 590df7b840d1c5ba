use crate::core::Block;
use log::info;

// Difficulty adjustment constants
pub const TARGET_BLOCK_TIME: u64 = 60; // seconds
pub const RETARGET_WINDOW: u64 = 10; // blocks looked back on each check
pub const INITIAL_BITS: u32 = 5; // starting difficulty
pub const MIN_BITS: u32 = 1; // minimum difficulty
pub const MAX_BITS: u32 = crate::core::proof_of_work::MAX_BITS;

/// Difficulty adjustment algorithm for maintaining consistent block times
pub struct DifficultyAdjustment;

impl DifficultyAdjustment {
    /// Compute the difficulty the next block must meet.
    ///
    /// `chain` is the accepted chain in height order (index == height). Below
    /// `window` blocks nothing changes. Otherwise the time the last `window`
    /// blocks took is compared with `window * target_block_time`: under half
    /// of it raises `bits` by one, over double lowers it by one.
    pub fn retarget(
        current_bits: u32,
        chain: &[Block],
        target_block_time: u64,
        window: u64,
    ) -> u32 {
        let Some(tip) = chain.last() else {
            return current_bits;
        };
        let height = tip.get_height();
        if window == 0 || height < window {
            return current_bits;
        }

        let Some(past) = usize::try_from(height - window)
            .ok()
            .and_then(|idx| chain.get(idx))
        else {
            return current_bits;
        };

        let actual = tip.get_timestamp().saturating_sub(past.get_timestamp());
        let target = window.saturating_mul(target_block_time);
        let new_bits = Self::adjust_bits(current_bits, actual, target);

        if new_bits != current_bits {
            info!(
                "Difficulty adjustment at height {height}: {current_bits} -> {new_bits} \
                 (actual: {actual}s, target: {target}s)"
            );
        }
        new_bits
    }

    /// Adjust difficulty based on actual vs target time
    fn adjust_bits(current_bits: u32, actual_time: u64, target_time: u64) -> u32 {
        if actual_time < (target_time / 2).max(1) {
            // blocks are coming too fast
            (current_bits + 1).min(MAX_BITS)
        } else if actual_time > target_time.saturating_mul(2) {
            // too slow
            current_bits.saturating_sub(1).max(MIN_BITS)
        } else {
            current_bits
        }
    }
}
