/// Word-bank / gap assignment for the writing task.
///
/// Words are referenced by their index in the bank, gaps by position in the
/// passage. The single invariant, enforced at every mutation: a word sits in
/// at most one gap at a time. Dropping a word into a filled gap evicts the
/// previous word back to the bank; clearing a gap returns its word to the
/// bank exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapBoard {
    /// `gaps[g]` holds the bank index of the word currently filling gap `g`.
    gaps: Vec<Option<usize>>,
    word_count: usize,
}

impl GapBoard {
    pub fn new(gap_count: usize, word_count: usize) -> Self {
        Self {
            gaps: vec![None; gap_count],
            word_count,
        }
    }

    pub fn gap_count(&self) -> usize {
        self.gaps.len()
    }

    /// Bank index of the word filling `gap`, if any.
    pub fn gap_word(&self, gap: usize) -> Option<usize> {
        self.gaps.get(gap).copied().flatten()
    }

    /// True while `word` occupies some gap (rendered dimmed in the bank).
    pub fn word_in_use(&self, word: usize) -> bool {
        self.gaps.contains(&Some(word))
    }

    /// Assigns `word` to `gap`. The gap's previous occupant (if different)
    /// goes back to the bank, and if `word` was sitting in another gap that
    /// gap is emptied, so the in-use invariant holds after every call.
    pub fn assign(&mut self, word: usize, gap: usize) {
        if word >= self.word_count || gap >= self.gaps.len() {
            return;
        }
        for slot in self.gaps.iter_mut() {
            if *slot == Some(word) {
                *slot = None;
            }
        }
        self.gaps[gap] = Some(word);
        debug_assert!(self.in_use_at_most_once(word));
    }

    /// Empties `gap`, returning the freed word's bank index if the gap was
    /// filled. A second clear of the same gap is a no-op.
    pub fn clear(&mut self, gap: usize) -> Option<usize> {
        self.gaps.get_mut(gap).and_then(|slot| slot.take())
    }

    fn in_use_at_most_once(&self, word: usize) -> bool {
        self.gaps.iter().filter(|s| **s == Some(word)).count() <= 1
    }
}
