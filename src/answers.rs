use crate::gapfill::GapBoard;
use crate::paper::Paper;
use std::collections::BTreeMap;

pub const LISTENING_QUESTIONS: usize = 8;
pub const READING_QUESTIONS: usize = 8;
pub const WRITING_GAPS: usize = 4;

/// Everything the candidate has entered so far: one selected choice per
/// multiple-choice question, the gap board, and the free-text email.
///
/// Nothing here is persisted locally; the sheet is read out once at submit
/// time.
#[derive(Debug, Clone)]
pub struct AnswerSheet {
    pub listening: Vec<Option<usize>>,
    pub reading: Vec<Option<usize>>,
    pub gaps: GapBoard,
    pub email_text: String,
}

impl AnswerSheet {
    pub fn new(paper: &Paper) -> Self {
        Self {
            listening: vec![None; paper.listening.len()],
            reading: vec![None; paper.reading.len()],
            gaps: GapBoard::new(paper.gap_count(), paper.writing.word_bank.len()),
            email_text: String::new(),
        }
    }

    /// Reads the sheet into the flat wire map: `q1..q8`, `r1..r8`, `w1..w4`.
    /// Every key is always present; unanswered questions map to the empty
    /// string, never to a missing key. Selected choices are reported as
    /// letters (`A`, `B`, ...), gaps as the dropped word.
    pub fn collect(&self, paper: &Paper) -> BTreeMap<String, String> {
        let mut answers = BTreeMap::new();

        for (i, sel) in self.listening.iter().enumerate() {
            answers.insert(format!("q{}", i + 1), choice_letter(*sel));
        }
        for (i, sel) in self.reading.iter().enumerate() {
            answers.insert(format!("r{}", i + 1), choice_letter(*sel));
        }
        for gap in 0..self.gaps.gap_count() {
            let word = self
                .gaps
                .gap_word(gap)
                .and_then(|w| paper.writing.word_bank.get(w))
                .cloned()
                .unwrap_or_default();
            answers.insert(format!("w{}", gap + 1), word);
        }

        answers
    }
}

fn choice_letter(selection: Option<usize>) -> String {
    match selection {
        Some(idx) => char::from(b'A' + (idx as u8 % 26)).to_string(),
        None => String::new(),
    }
}
