//! Shuffle-order generation and maintenance.
//!
//! A shuffle order is a permutation of `0..playlist.len()`: position `i` in
//! shuffled traversal maps to sequential index `order[i]`. Orders are never
//! carried over between playlist builds; removal of a single song repairs
//! the existing order in place.

use rand::Rng;
use rand::seq::SliceRandom;

pub fn generate<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

/// Repair an order after the song at `removed_seq` left the playlist: drop
/// its entry, then shift every entry above it down by one so the order is
/// again a permutation of the shorter index range.
pub fn on_song_removed(order: &mut Vec<usize>, removed_seq: usize) {
    order.retain(|&entry| entry != removed_seq);
    for entry in order.iter_mut() {
        if *entry > removed_seq {
            *entry -= 1;
        }
    }
}
