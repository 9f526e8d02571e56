use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

static PAPER_DIR: Dir = include_dir!("src/paper");

/// A multiple-choice question (listening or reading section).
#[derive(Deserialize, Clone, Debug)]
pub struct Question {
    pub text: String,
    pub choices: Vec<String>,
}

/// The writing section: a gap-fill passage plus a free-text email task.
///
/// `gap_segments` are the text pieces between gaps, so a passage with N gaps
/// carries N+1 segments.
#[derive(Deserialize, Clone, Debug)]
pub struct WritingTask {
    pub gap_segments: Vec<String>,
    pub word_bank: Vec<String>,
    pub email_prompt: String,
}

/// One exam paper: content only, no scoring data. The answer key lives with
/// the remote authority.
#[derive(Deserialize, Clone, Debug)]
pub struct Paper {
    pub name: String,
    pub listening_track_secs: u64,
    pub listening: Vec<Question>,
    pub reading_passage: String,
    pub reading: Vec<Question>,
    pub writing: WritingTask,
}

impl Paper {
    pub fn load(file_name: &str) -> Self {
        read_paper_from_file(format!("{file_name}.json")).unwrap()
    }

    pub fn gap_count(&self) -> usize {
        self.writing.gap_segments.len().saturating_sub(1)
    }
}

fn read_paper_from_file(file_name: String) -> Result<Paper, Box<dyn Error>> {
    let file = PAPER_DIR.get_file(file_name).expect("Paper file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let paper = from_str(file_as_str).expect("Unable to deserialize paper json");

    Ok(paper)
}
