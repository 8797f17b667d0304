//! The sequencing engine: an index-based cursor over a mutable, ordered
//! entity list.
//!
//! A [`Sequence`] owns its entities and exactly one active
//! [`AdvancePattern`]. Traversal is driven externally through repeated
//! `current`/`advance` pairs: finite under the linear pattern, infinite under
//! an active loop. New entities may be spliced in only at the cursor, either
//! physically unrolled a finite number of times or installed as an active
//! loop via [`Repeat::Unbounded`].

use crate::core::error::{SequenceError, SequenceResult};
use crate::sequence::pattern::{AdvancePattern, Repeat};

/// An ordered entity list with a cursor and a swappable advance pattern.
#[derive(Debug, Clone)]
pub struct Sequence<T> {
    entities: Vec<T>,
    index: usize,
    pattern: AdvancePattern,
}

impl<T> Sequence<T> {
    /// Create a sequence over `entities`, cursor at the first entity,
    /// linear pattern active.
    pub fn new(entities: Vec<T>) -> Self {
        Self {
            entities,
            index: 0,
            pattern: AdvancePattern::Linear,
        }
    }

    /// Number of entities currently in the sequence.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the sequence holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The current cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The currently active advance pattern.
    pub fn pattern(&self) -> AdvancePattern {
        self.pattern
    }

    /// All entities in order.
    pub fn entities(&self) -> &[T] {
        &self.entities
    }

    /// The entity under the cursor.
    ///
    /// Errors with [`SequenceError::OutOfRange`] if the cursor is not at a
    /// valid position. Under correct pattern discipline this does not
    /// happen; an occurrence indicates a bug in the caller, not input data.
    pub fn current(&self) -> SequenceResult<&T> {
        self.entities.get(self.index).ok_or(SequenceError::OutOfRange {
            index: self.index,
            len: self.entities.len(),
        })
    }

    /// Mutable access to the entity under the cursor.
    pub fn current_mut(&mut self) -> SequenceResult<&mut T> {
        let len = self.entities.len();
        self.entities
            .get_mut(self.index)
            .ok_or(SequenceError::OutOfRange {
                index: self.index,
                len,
            })
    }

    /// Move the cursor forward under the active pattern.
    ///
    /// Signals [`SequenceError::Exhausted`] when the linear pattern runs
    /// past the end of the entity list; never signals exhaustion under an
    /// active loop.
    pub fn advance(&mut self) -> SequenceResult<()> {
        self.index = self.pattern.increment(self.index, self.entities.len())?;
        Ok(())
    }

    /// Revert the active pattern to linear, pinned at the current cursor.
    ///
    /// No effect if no loop is active.
    pub fn stop_repeating(&mut self) {
        if self.pattern.is_loop() {
            log::debug!(
                "stop repeating: reverting to linear at index {}",
                self.index
            );
            self.pattern = AdvancePattern::Linear;
        }
    }

    /// Rewind the cursor to the first entity. The active pattern is
    /// untouched.
    pub fn reset(&mut self) {
        self.index = 0;
    }
}

impl<T: Clone> Sequence<T> {
    /// Splice `new_entities` into the list at the cursor.
    ///
    /// The new block lands before the entity currently under the cursor;
    /// entities at and after the cursor shift right. No entity is lost or
    /// duplicated beyond the requested repetition.
    ///
    /// With [`Repeat::Unbounded`] the block is spliced once and the active
    /// pattern is replaced by a loop covering exactly the inserted block —
    /// an empty block yields a degenerate `start == end` loop that wraps in
    /// place forever. With [`Repeat::Times`] the block is unrolled that many
    /// times, the currently active pattern's boundary is grown by the
    /// unrolled length (so an enclosing loop keeps covering the insertion),
    /// and the expanded block is spliced in; a count of zero is a no-op
    /// insert.
    pub fn insert(&mut self, new_entities: Vec<T>, repeat: Repeat) {
        match repeat {
            Repeat::Unbounded => {
                let start = self.index;
                let end = start + new_entities.len();
                self.entities.splice(start..start, new_entities);
                self.pattern = AdvancePattern::Loop { start, end };
                log::debug!("activated loop over [{}, {})", start, end);
            }
            Repeat::Times(count) => {
                let unrolled = unroll(new_entities, count);
                self.pattern.adjust(unrolled.len());
                if !unrolled.is_empty() {
                    log::debug!(
                        "spliced {} entities at index {}",
                        unrolled.len(),
                        self.index
                    );
                }
                self.entities.splice(self.index..self.index, unrolled);
            }
        }
    }
}

/// Repeat `block` in order, `count` times.
fn unroll<T: Clone>(block: Vec<T>, count: usize) -> Vec<T> {
    match count {
        0 => Vec::new(),
        1 => block,
        _ => {
            let mut out = Vec::with_capacity(block.len() * count);
            for _ in 0..count {
                out.extend(block.iter().cloned());
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Collect the entities visited over `steps` current/advance pairs.
    fn traverse(seq: &mut Sequence<char>, steps: usize) -> Vec<char> {
        let mut seen = Vec::new();
        for _ in 0..steps {
            match seq.current() {
                Ok(c) => seen.push(*c),
                Err(_) => break,
            }
            if seq.advance().is_err() {
                break;
            }
        }
        seen
    }

    #[test]
    fn test_linear_visits_each_entity_once() {
        let mut seq = Sequence::new(vec!['a', 'b', 'c']);
        assert_eq!(traverse(&mut seq, 10), vec!['a', 'b', 'c']);
        assert_eq!(seq.advance(), Err(SequenceError::Exhausted));
    }

    #[test]
    fn test_current_out_of_range_after_exhaustion() {
        let mut seq = Sequence::new(vec!['a']);
        seq.advance().unwrap();
        assert_eq!(
            seq.current(),
            Err(SequenceError::OutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn test_empty_sequence_exhausts_on_first_advance() {
        let mut seq: Sequence<char> = Sequence::new(Vec::new());
        assert_eq!(seq.advance(), Err(SequenceError::Exhausted));
    }

    #[test]
    fn test_unbounded_insert_loops_over_block_only() {
        // [A, B, C] with [X] spliced unbounded at index 1 traverses
        // A, X, X, X, ... — B and C become unreachable by pure advancing.
        let mut seq = Sequence::new(vec!['a', 'b', 'c']);
        assert_eq!(seq.current(), Ok(&'a'));
        seq.advance().unwrap();
        seq.insert(vec!['x'], Repeat::Unbounded);

        assert_eq!(seq.current(), Ok(&'x'));
        assert_eq!(seq.entities(), &['a', 'x', 'b', 'c']);
        assert_eq!(seq.pattern(), AdvancePattern::Loop { start: 1, end: 2 });
        assert_eq!(traverse(&mut seq, 6), vec!['x'; 6]);
    }

    #[test]
    fn test_unbounded_insert_of_wider_block_wraps() {
        let mut seq = Sequence::new(vec!['a', 'b']);
        seq.advance().unwrap();
        seq.insert(vec!['x', 'y'], Repeat::Unbounded);
        assert_eq!(seq.entities(), &['a', 'x', 'y', 'b']);
        assert_eq!(traverse(&mut seq, 5), vec!['x', 'y', 'x', 'y', 'x']);
    }

    #[test]
    fn test_stop_repeating_resumes_linear_traversal() {
        let mut seq = Sequence::new(vec!['a', 'b', 'c']);
        seq.advance().unwrap();
        seq.insert(vec!['x'], Repeat::Unbounded);
        seq.advance().unwrap(); // wraps in the loop
        assert_eq!(seq.current(), Ok(&'x'));

        seq.stop_repeating();
        assert_eq!(seq.pattern(), AdvancePattern::Linear);
        assert_eq!(traverse(&mut seq, 10), vec!['x', 'b', 'c']);
        assert_eq!(seq.advance(), Err(SequenceError::Exhausted));
    }

    #[test]
    fn test_stop_repeating_is_noop_under_linear() {
        let mut seq = Sequence::new(vec!['a']);
        seq.stop_repeating();
        assert_eq!(seq.pattern(), AdvancePattern::Linear);
        assert_eq!(seq.index(), 0);
    }

    #[test]
    fn test_finite_insert_unrolls_block() {
        let mut seq = Sequence::new(vec!['a', 'b']);
        seq.advance().unwrap();
        seq.insert(vec!['x', 'y'], Repeat::Times(2));
        assert_eq!(seq.entities(), &['a', 'x', 'y', 'x', 'y', 'b']);
        assert_eq!(seq.pattern(), AdvancePattern::Linear);
    }

    #[test]
    fn test_finite_insert_of_zero_is_noop() {
        let mut seq = Sequence::new(vec!['a', 'b']);
        seq.insert(vec!['x'], Repeat::Times(0));
        assert_eq!(seq.entities(), &['a', 'b']);
    }

    #[test]
    fn test_finite_insert_grows_enclosing_loop() {
        // Loop over [1, 3); splicing 2 copies of a 1-entity block inside it
        // must grow the end to 3 + 2*1 = 5.
        let mut seq = Sequence::new(vec!['a', 'b', 'c', 'd']);
        seq.advance().unwrap();
        seq.insert(vec!['x', 'y'], Repeat::Unbounded);
        assert_eq!(seq.pattern(), AdvancePattern::Loop { start: 1, end: 3 });

        seq.advance().unwrap(); // to 'y' inside the loop
        seq.insert(vec!['z'], Repeat::Times(2));
        assert_eq!(seq.pattern(), AdvancePattern::Loop { start: 1, end: 5 });
        assert_eq!(seq.entities(), &['a', 'x', 'z', 'z', 'y', 'b', 'c', 'd']);
        // The loop now covers x, z, z, y.
        assert_eq!(
            traverse(&mut seq, 8),
            vec!['z', 'z', 'y', 'x', 'z', 'z', 'y', 'x']
        );
    }

    #[test]
    fn test_empty_unbounded_insert_is_degenerate_loop() {
        let mut seq = Sequence::new(vec!['a', 'b']);
        seq.advance().unwrap();
        seq.insert(Vec::new(), Repeat::Unbounded);
        assert_eq!(seq.pattern(), AdvancePattern::Loop { start: 1, end: 1 });
        // Advancing must neither move the cursor nor panic.
        for _ in 0..10 {
            seq.advance().unwrap();
            assert_eq!(seq.index(), 1);
        }
    }

    #[test]
    fn test_reset_rewinds_cursor() {
        let mut seq = Sequence::new(vec!['a', 'b']);
        seq.advance().unwrap();
        seq.reset();
        assert_eq!(seq.current(), Ok(&'a'));
    }

    proptest! {
        #[test]
        fn prop_linear_traversal_preserves_order(entities in proptest::collection::vec(any::<u8>(), 0..32)) {
            let mut seq = Sequence::new(entities.clone());
            let mut seen = Vec::new();
            loop {
                match seq.current() {
                    Ok(e) => seen.push(*e),
                    Err(_) => break,
                }
                if seq.advance().is_err() {
                    break;
                }
            }
            prop_assert_eq!(seen, entities);
            prop_assert_eq!(seq.advance(), Err(SequenceError::Exhausted));
        }

        #[test]
        fn prop_loop_cursor_stays_in_bounds(
            len in 2usize..16,
            start in 0usize..8,
            width in 1usize..8,
            steps in 1usize..64,
        ) {
            let start = start.min(len - 1);
            let end = (start + width).min(len);
            let mut seq = Sequence::new((0..len as u32).collect::<Vec<_>>());
            for _ in 0..start {
                seq.advance().unwrap();
            }
            // Install a loop over the existing window [start, end) by
            // splicing its contents as an unbounded block.
            let block: Vec<u32> = (start as u32..end as u32).collect();
            seq.insert(block, Repeat::Unbounded);
            for _ in 0..steps {
                seq.advance().unwrap();
                prop_assert!(seq.index() >= start && seq.index() < end.max(start + 1));
            }
        }
    }
}
