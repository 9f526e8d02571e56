use serde::Deserialize;

use crate::api::ApiError;

/// Exam progress as reported by the remote authority. The authority is the
/// single source of truth; this value is fetched once at startup and never
/// re-fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    NotStarted,
    ListeningNotStarted,
    AfterListening,
    Ended,
    TimeOver,
}

/// Which of the five screens is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Screen {
    Start,
    Listening,
    Reading,
    Writing,
    Ended,
}

/// Instructions for the shell that a transition produced. The machine stays
/// pure; the driver starts timers and fires network calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    /// Start (or restart) the exam countdown with this many seconds.
    StartCountdown(u64),
    /// Fire the best-effort `listen_started` notification.
    NotifyListenStarted,
}

/// Why an audio request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioRefusal {
    /// The exam has not been started yet; surface an informational prompt.
    NotStarted,
    /// The one-shot play has already happened; strict no-op.
    AlreadyPlayed,
}

/// Client-side view of one exam attempt.
///
/// Replaces the original page's scattered globals (`testStarted`,
/// `hasPlayedOnce`, `timerInterval`) with one owned value whose transitions
/// are plain functions, so the whole flow is testable without a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub screen: Screen,
    pub started: bool,
    pub has_played_once: bool,
    pub audio_playing: bool,
    /// One-way: set on submit success or time-over, never cleared.
    pub locked: bool,
    status_applied: bool,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            screen: Screen::Start,
            started: false,
            has_played_once: false,
            audio_playing: false,
            locked: false,
            status_applied: false,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Applies the load-time `status` answer. Re-entry after a refresh must
    /// not restart the exam or replay the start confirmation, so an
    /// in-progress status jumps straight to the matching screen. A stale
    /// reply arriving after the user has already progressed (or after a
    /// previous reply) is dropped.
    pub fn apply_status(
        &mut self,
        status: RemoteStatus,
        remaining_seconds: u64,
    ) -> Option<SessionEffect> {
        if self.status_applied || self.started || self.locked {
            return None;
        }
        self.status_applied = true;

        match status {
            RemoteStatus::Ended | RemoteStatus::TimeOver => {
                self.screen = Screen::Ended;
                self.locked = true;
                None
            }
            RemoteStatus::NotStarted => None,
            RemoteStatus::ListeningNotStarted | RemoteStatus::AfterListening => {
                self.started = true;
                self.screen = match status {
                    RemoteStatus::ListeningNotStarted => Screen::Listening,
                    _ => Screen::Reading,
                };
                if status == RemoteStatus::AfterListening {
                    // The one-shot play already happened in a previous visit
                    self.has_played_once = true;
                }
                (remaining_seconds > 0).then_some(SessionEffect::StartCountdown(remaining_seconds))
            }
        }
    }

    /// The user confirmed the start dialog. Optimistic: the session counts
    /// as started before the wire reply lands; `start_failed` rolls back.
    pub fn confirm_start(&mut self) -> Option<SessionEffect> {
        if self.screen != Screen::Start || self.locked || !self.has_token() {
            return None;
        }
        self.started = true;
        self.screen = Screen::Listening;
        Some(SessionEffect::StartCountdown(60 * 60))
    }

    /// The authority rejected `start`; back to the start screen.
    pub fn start_failed(&mut self, _err: &ApiError) {
        if self.locked {
            return;
        }
        self.started = false;
        self.screen = Screen::Start;
    }

    /// The user asked to play the listening track. At most one play per
    /// session; a second request is a strict no-op (no duplicate completion
    /// handlers, no duplicate `listen_started`).
    pub fn request_audio(&mut self) -> Result<SessionEffect, AudioRefusal> {
        if !self.started {
            return Err(AudioRefusal::NotStarted);
        }
        if self.has_played_once {
            return Err(AudioRefusal::AlreadyPlayed);
        }
        self.has_played_once = true;
        self.audio_playing = true;
        Ok(SessionEffect::NotifyListenStarted)
    }

    /// Natural end of the listening track auto-advances to Reading.
    pub fn audio_ended(&mut self) {
        if !self.audio_playing {
            return;
        }
        self.audio_playing = false;
        if self.screen == Screen::Listening && !self.locked {
            self.screen = Screen::Reading;
        }
    }

    pub fn to_writing(&mut self) {
        if self.screen == Screen::Reading && !self.locked {
            self.screen = Screen::Writing;
        }
    }

    pub fn back_to_reading(&mut self) {
        if self.screen == Screen::Writing && !self.locked {
            self.screen = Screen::Reading;
        }
    }

    /// Final submit accepted: lock everything and show the end screen.
    pub fn submit_succeeded(&mut self) {
        self.screen = Screen::Ended;
        self.locked = true;
    }

    /// Final submit rejected: stay on Writing, keep inputs enabled so the
    /// candidate can retry. No local state is cleared.
    pub fn submit_failed(&mut self, _err: &ApiError) {}

    /// The countdown crossed zero. Terminal; only a fresh attempt (new
    /// token) undoes it.
    pub fn time_over(&mut self) {
        self.locked = true;
        self.audio_playing = false;
    }
}
