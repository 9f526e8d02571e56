use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::answers::AnswerSheet;
use crate::api::{ApiCall, ApiError, ApiReply, ApiRequest, ApiWorker};
use crate::countdown::Countdown;
use crate::paper::Paper;
use crate::session::{Screen, Session, SessionEffect};

const MISSING_TOKEN_MSG: &str = "Missing token in the URL. Please contact your teacher.";
const INVALID_TOKEN_MSG: &str = "This link is not valid. Please contact your teacher.";
const ALREADY_USED_MSG: &str = "You have already completed this test.";

/// Progress of the one-shot listening play, measured against the wall clock
/// like the countdown. The audio itself is delivered out of band; the
/// client only tracks the window in which it is running.
#[derive(Debug, Clone, Copy)]
pub struct Playback {
    started_at: Instant,
    duration: Duration,
}

impl Playback {
    pub fn start(duration_secs: u64, now: Instant) -> Self {
        Self {
            started_at: now,
            duration: Duration::from_secs(duration_secs),
        }
    }

    pub fn finished(&self, now: Instant) -> bool {
        now.duration_since(self.started_at) >= self.duration
    }

    /// 0.0..=1.0 for the progress gauge.
    pub fn progress(&self, now: Instant) -> f64 {
        let elapsed = now.duration_since(self.started_at).as_secs_f64();
        (elapsed / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Action queued behind a confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    StartExam,
    PlayAudio,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    Info,
    Confirm(PendingAction),
}

/// A blocking dialog. Enter confirms, Esc dismisses (cancel for confirms).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub title: String,
    pub message: String,
    pub kind: ModalKind,
}

impl Modal {
    pub fn info(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            kind: ModalKind::Info,
        }
    }

    pub fn confirm(title: &str, message: &str, action: PendingAction) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            kind: ModalKind::Confirm(action),
        }
    }
}

/// Which pane owns keystrokes on the writing screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingFocus {
    Gaps,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    Idle,
    Playing,
    Done,
}

/// The whole client: session machine, countdown, answer sheet, dialog and
/// focus state. Every event handler runs to completion; the only writers
/// are `on_key`, `on_tick` and `on_api`, which the event loop serializes.
pub struct App {
    pub session: Session,
    pub paper: Paper,
    pub sheet: AnswerSheet,
    pub countdown: Option<Countdown>,
    pub playback: Option<Playback>,
    pub audio_status: AudioStatus,
    pub modal: Option<Modal>,
    pub loading: bool,
    /// Inline error line on the start screen.
    pub start_error: Option<String>,
    /// Selected question on the listening/reading screens.
    pub question_cursor: usize,
    pub writing_focus: WritingFocus,
    pub gap_cursor: usize,
    pub word_cursor: usize,
    worker: ApiWorker,
}

impl App {
    /// Builds the app and, when a token is present, fires the one-time
    /// `status` poll. Without a token every authoritative action stays
    /// disabled behind the inline message.
    pub fn new(token: Option<String>, paper: Paper, worker: ApiWorker) -> Self {
        let session = Session::new(token);
        let sheet = AnswerSheet::new(&paper);

        let mut app = Self {
            session,
            paper,
            sheet,
            countdown: None,
            playback: None,
            audio_status: AudioStatus::Idle,
            modal: None,
            loading: false,
            start_error: None,
            question_cursor: 0,
            writing_focus: WritingFocus::Gaps,
            gap_cursor: 0,
            word_cursor: 0,
            worker,
        };

        if app.session.has_token() {
            app.loading = true;
            let token = app.session.token.clone().unwrap_or_default();
            app.worker.dispatch(ApiCall::Status, ApiRequest::Status { token });
        } else {
            app.start_error = Some(MISSING_TOKEN_MSG.to_string());
        }

        app
    }

    fn apply_effect(&mut self, effect: SessionEffect, now: Instant) {
        match effect {
            SessionEffect::StartCountdown(secs) => {
                // Replaces any previous countdown; there is never more than
                // one live deadline
                self.countdown = Some(Countdown::start(secs, now));
            }
            SessionEffect::NotifyListenStarted => {
                if let Some(token) = self.session.token.clone() {
                    self.worker.notify_listen_started(token);
                }
            }
        }
    }

    /// One timer step. Drives the countdown expiry edge and the simulated
    /// listening playback window.
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(cd) = self.countdown {
            if cd.is_expired(now) && !self.session.locked {
                self.session.time_over();
                self.playback = None;
                self.modal = Some(Modal::info(
                    "Time over",
                    "Time is over. The test is now locked.",
                ));
            }
        }

        if let Some(pb) = self.playback {
            if pb.finished(now) && self.session.audio_playing {
                self.playback = None;
                self.audio_status = AudioStatus::Done;
                self.session.audio_ended();
                self.question_cursor = 0;
            }
        }
    }

    /// A completed network call. Always resolves the loading indicator so
    /// the UI can never hang on a dead request.
    pub fn on_api(&mut self, reply: ApiReply, now: Instant) {
        self.loading = false;

        match reply.call {
            ApiCall::Status => match reply.result {
                Ok(resp) => {
                    if let Some(status) = resp.status {
                        let remaining = resp.remaining_seconds.unwrap_or(0);
                        if let Some(effect) = self.session.apply_status(status, remaining) {
                            self.apply_effect(effect, now);
                        }
                    }
                }
                Err(ApiError::InvalidToken) => {
                    self.start_error = Some(INVALID_TOKEN_MSG.to_string());
                }
                Err(_) => {
                    self.modal = Some(Modal::info(
                        "Server error",
                        "Server error while loading test status. Please close this tab and try again.",
                    ));
                }
            },
            ApiCall::Start => match reply.result {
                Ok(_) => {}
                Err(err) => {
                    self.session.start_failed(&err);
                    self.countdown = None;
                    self.start_error = Some(match err {
                        ApiError::InvalidToken => INVALID_TOKEN_MSG.to_string(),
                        ApiError::AlreadyUsed => ALREADY_USED_MSG.to_string(),
                        ApiError::Transport(_) => "Server error starting test.".to_string(),
                        other => format!("Error starting test: {other}"),
                    });
                }
            },
            ApiCall::Submit => match reply.result {
                Ok(_) => {
                    self.session.submit_succeeded();
                    self.countdown = None;
                }
                Err(err) => {
                    self.session.submit_failed(&err);
                    self.modal = Some(match err {
                        ApiError::AlreadyUsed => {
                            Modal::info("Error", "This link has already been used.")
                        }
                        ApiError::Transport(_) => {
                            Modal::info("Server error", "Server error submitting test.")
                        }
                        other => Modal::info("Error", &format!("Error submitting: {other}")),
                    });
                }
            },
        }
    }

    /// Keyboard input. Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if self.modal.is_some() {
            self.on_modal_key(key, now);
            return false;
        }

        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return true;
        }

        // Terminal states: everything except quitting is disabled
        if self.session.locked {
            return false;
        }

        match self.session.screen {
            Screen::Start => self.on_start_key(key),
            Screen::Listening => self.on_listening_key(key),
            Screen::Reading => self.on_reading_key(key),
            Screen::Writing => self.on_writing_key(key),
            Screen::Ended => {}
        }
        false
    }

    fn on_modal_key(&mut self, key: KeyEvent, now: Instant) {
        let Some(modal) = self.modal.clone() else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                self.modal = None;
                if let ModalKind::Confirm(action) = modal.kind {
                    self.run_confirmed(action, now);
                }
            }
            KeyCode::Esc => {
                self.modal = None;
            }
            _ => {}
        }
    }

    fn run_confirmed(&mut self, action: PendingAction, now: Instant) {
        match action {
            PendingAction::StartExam => {
                if let Some(effect) = self.session.confirm_start() {
                    self.apply_effect(effect, now);
                    self.loading = true;
                    let token = self.session.token.clone().unwrap_or_default();
                    self.worker.dispatch(ApiCall::Start, ApiRequest::Start { token });
                }
            }
            PendingAction::PlayAudio => match self.session.request_audio() {
                Ok(effect) => {
                    self.playback =
                        Some(Playback::start(self.paper.listening_track_secs, now));
                    self.audio_status = AudioStatus::Playing;
                    self.apply_effect(effect, now);
                }
                Err(_) => {}
            },
            PendingAction::Submit => {
                self.loading = true;
                let token = self.session.token.clone().unwrap_or_default();
                self.worker.dispatch(
                    ApiCall::Submit,
                    ApiRequest::Submit {
                        token,
                        answers: self.sheet.collect(&self.paper),
                        email_text: self.sheet.email_text.clone(),
                    },
                );
            }
        }
    }

    fn on_start_key(&mut self, key: KeyEvent) {
        if key.code != KeyCode::Enter {
            return;
        }
        self.start_error = None;
        if !self.session.has_token() {
            self.start_error = Some(MISSING_TOKEN_MSG.to_string());
            return;
        }
        self.modal = Some(Modal::confirm(
            "Start the test",
            "When you press OK, the 60-minute countdown will start.\n\
             You will not be able to return to this screen.\n\n\
             Do you want to start the test now?",
            PendingAction::StartExam,
        ));
    }

    fn request_audio(&mut self) {
        match self.session.screen {
            Screen::Listening => {}
            _ => return,
        }
        if self.session.has_played_once {
            // One-shot: silently ignore, matching the disabled play button
            return;
        }
        if !self.session.started {
            self.modal = Some(Modal::info("Attention", "You must start the test first."));
            return;
        }
        self.modal = Some(Modal::confirm(
            "Listening",
            "When you press OK, the listening audio will start.\n\
             You can listen only once and you cannot stop or restart it.\n\n\
             Do you want to start listening now?",
            PendingAction::PlayAudio,
        ));
    }

    fn on_listening_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('p') => self.request_audio(),
            _ => {
                // Questions open up once the audio is running
                if self.audio_status != AudioStatus::Idle {
                    let count = self.paper.listening.len();
                    let selections = &mut self.sheet.listening;
                    let choices = &self.paper.listening;
                    question_nav(key, count, &mut self.question_cursor, selections, choices);
                }
            }
        }
    }

    fn on_reading_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('n') {
            self.session.to_writing();
            self.question_cursor = 0;
            return;
        }
        let count = self.paper.reading.len();
        question_nav(
            key,
            count,
            &mut self.question_cursor,
            &mut self.sheet.reading,
            &self.paper.reading,
        );
    }

    fn on_writing_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('b') => {
                    self.session.back_to_reading();
                    self.question_cursor = 0;
                }
                KeyCode::Char('s') => {
                    if !self.session.has_token() {
                        self.modal =
                            Some(Modal::info("Error", "Missing token in the URL. Cannot submit."));
                        return;
                    }
                    self.modal = Some(Modal::confirm(
                        "Submit test",
                        "Are you sure you want to submit all your answers?",
                        PendingAction::Submit,
                    ));
                }
                _ => {}
            }
            return;
        }

        if key.code == KeyCode::Tab {
            self.writing_focus = match self.writing_focus {
                WritingFocus::Gaps => WritingFocus::Email,
                WritingFocus::Email => WritingFocus::Gaps,
            };
            return;
        }

        match self.writing_focus {
            WritingFocus::Gaps => self.on_gap_key(key),
            WritingFocus::Email => self.on_email_key(key),
        }
    }

    fn on_gap_key(&mut self, key: KeyEvent) {
        let gap_count = self.paper.gap_count();
        let word_count = self.paper.writing.word_bank.len();
        match key.code {
            KeyCode::Left => self.gap_cursor = self.gap_cursor.saturating_sub(1),
            KeyCode::Right => {
                self.gap_cursor = (self.gap_cursor + 1).min(gap_count.saturating_sub(1))
            }
            KeyCode::Up => self.word_cursor = self.word_cursor.saturating_sub(1),
            KeyCode::Down => {
                self.word_cursor = (self.word_cursor + 1).min(word_count.saturating_sub(1))
            }
            KeyCode::Enter => self.sheet.gaps.assign(self.word_cursor, self.gap_cursor),
            KeyCode::Backspace | KeyCode::Delete => {
                self.sheet.gaps.clear(self.gap_cursor);
            }
            _ => {}
        }
    }

    fn on_email_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.sheet.email_text.push(c),
            KeyCode::Enter => self.sheet.email_text.push('\n'),
            KeyCode::Backspace => {
                self.sheet.email_text.pop();
            }
            _ => {}
        }
    }
}

/// Shared up/down/left/right handling for multiple-choice question lists.
fn question_nav(
    key: KeyEvent,
    count: usize,
    cursor: &mut usize,
    selections: &mut [Option<usize>],
    questions: &[crate::paper::Question],
) {
    if count == 0 {
        return;
    }
    match key.code {
        KeyCode::Up => *cursor = cursor.saturating_sub(1),
        KeyCode::Down => *cursor = (*cursor + 1).min(count - 1),
        KeyCode::Left | KeyCode::Right => {
            let n_choices = questions[*cursor].choices.len();
            let current = selections[*cursor];
            selections[*cursor] = Some(match (key.code, current) {
                (KeyCode::Right, None) => 0,
                (KeyCode::Right, Some(i)) => (i + 1) % n_choices,
                (KeyCode::Left, None) => n_choices - 1,
                (KeyCode::Left, Some(i)) => (i + n_choices - 1) % n_choices,
                _ => unreachable!(),
            });
        }
        KeyCode::Char(c @ '1'..='9') => {
            let idx = (c as usize) - ('1' as usize);
            if idx < questions[*cursor].choices.len() {
                selections[*cursor] = Some(idx);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResponse, AuthorityClient};
    use crate::runtime::ExamEvent;
    use crate::session::RemoteStatus;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::{Arc, Mutex};

    /// Client whose replies are scripted per call kind.
    struct ScriptedClient {
        replies: Mutex<Vec<Result<ApiResponse, ApiError>>>,
    }

    impl ScriptedClient {
        fn new(mut replies: Vec<Result<ApiResponse, ApiError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
            })
        }
    }

    impl AuthorityClient for ScriptedClient {
        fn call(&self, _request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ApiError::Transport("script exhausted".into())))
        }
    }

    fn ok_status(status: RemoteStatus, remaining: u64) -> Result<ApiResponse, ApiError> {
        Ok(ApiResponse {
            ok: true,
            status: Some(status),
            remaining_seconds: Some(remaining),
            error: None,
        })
    }

    fn ok_plain() -> Result<ApiResponse, ApiError> {
        Ok(ApiResponse {
            ok: true,
            ..Default::default()
        })
    }

    fn app_with(replies: Vec<Result<ApiResponse, ApiError>>) -> (App, Receiver<ExamEvent>) {
        let (tx, rx) = mpsc::channel();
        let worker = ApiWorker::new(ScriptedClient::new(replies), tx);
        let app = App::new(Some("tok".into()), Paper::load("default"), worker);
        (app, rx)
    }

    /// Pumps worker-thread completions into the app, like the event loop.
    fn pump(app: &mut App, rx: &Receiver<ExamEvent>, now: Instant) {
        while let Ok(ev) = rx.recv_timeout(Duration::from_secs(2)) {
            if let ExamEvent::Api(reply) = ev {
                app.on_api(reply, now);
                return;
            }
        }
        panic!("no api reply arrived");
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn missing_token_disables_everything_inline() {
        let (tx, _rx) = mpsc::channel();
        let worker = ApiWorker::new(ScriptedClient::new(vec![]), tx);
        let mut app = App::new(None, Paper::load("default"), worker);

        assert!(!app.loading);
        assert_eq!(app.start_error.as_deref(), Some(MISSING_TOKEN_MSG));

        // Enter on the start screen re-surfaces the message, no dialog
        app.on_key(key(KeyCode::Enter), Instant::now());
        assert!(app.modal.is_none());
        assert_eq!(app.start_error.as_deref(), Some(MISSING_TOKEN_MSG));
    }

    #[test]
    fn resume_after_listening_goes_straight_to_reading() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::AfterListening, 1800)]);
        assert!(app.loading);

        pump(&mut app, &rx, now);

        assert!(!app.loading);
        assert_eq!(app.session.screen, Screen::Reading);
        // Countdown mirrors the authority's remaining time: 30:00
        let cd = app.countdown.expect("countdown should be running");
        assert_eq!(cd.display(now), "30:00");
        // No start confirmation is replayed
        assert!(app.modal.is_none());
    }

    #[test]
    fn invalid_token_shows_inline_error_and_keeps_start_screen() {
        let (mut app, rx) = app_with(vec![Err(ApiError::InvalidToken)]);
        pump(&mut app, &rx, Instant::now());

        assert_eq!(app.session.screen, Screen::Start);
        assert_eq!(app.start_error.as_deref(), Some(INVALID_TOKEN_MSG));
        assert!(!app.loading);
    }

    #[test]
    fn transport_failure_resolves_loading_with_dialog() {
        let (mut app, rx) = app_with(vec![Err(ApiError::Transport("offline".into()))]);
        pump(&mut app, &rx, Instant::now());

        assert!(!app.loading);
        let modal = app.modal.expect("server error dialog");
        assert_eq!(modal.kind, ModalKind::Info);
        assert_eq!(modal.title, "Server error");
    }

    #[test]
    fn start_flow_confirms_then_counts_down() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![
            ok_status(RemoteStatus::NotStarted, 0),
            ok_plain(), // start
        ]);
        pump(&mut app, &rx, now);

        app.on_key(key(KeyCode::Enter), now);
        let modal = app.modal.clone().expect("confirm dialog");
        assert_eq!(modal.kind, ModalKind::Confirm(PendingAction::StartExam));

        app.on_key(key(KeyCode::Enter), now); // confirm
        assert_eq!(app.session.screen, Screen::Listening);
        let cd = app.countdown.expect("60 minute countdown");
        assert_eq!(cd.display(now), "60:00");

        pump(&mut app, &rx, now);
        assert_eq!(app.session.screen, Screen::Listening);
    }

    #[test]
    fn cancelled_start_dialog_changes_nothing() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::NotStarted, 0)]);
        pump(&mut app, &rx, now);

        app.on_key(key(KeyCode::Enter), now);
        app.on_key(key(KeyCode::Esc), now); // cancel

        assert_eq!(app.session.screen, Screen::Start);
        assert!(app.countdown.is_none());
        assert!(!app.session.started);
    }

    #[test]
    fn rejected_start_rolls_back_optimistic_transition() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![
            ok_status(RemoteStatus::NotStarted, 0),
            Err(ApiError::AlreadyUsed),
        ]);
        pump(&mut app, &rx, now);

        app.on_key(key(KeyCode::Enter), now);
        app.on_key(key(KeyCode::Enter), now);
        assert_eq!(app.session.screen, Screen::Listening);

        pump(&mut app, &rx, now);
        assert_eq!(app.session.screen, Screen::Start);
        assert!(app.countdown.is_none());
        assert_eq!(app.start_error.as_deref(), Some(ALREADY_USED_MSG));
    }

    #[test]
    fn audio_before_start_prompts_and_changes_nothing() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::ListeningNotStarted, 600)]);
        pump(&mut app, &rx, now);
        // Resumed mid-exam on the listening screen, but force the guard:
        app.session.started = false;

        app.on_key(key(KeyCode::Char('p')), now);
        let modal = app.modal.clone().expect("attention dialog");
        assert_eq!(modal.kind, ModalKind::Info);
        assert!(!app.session.has_played_once);
    }

    #[test]
    fn audio_plays_once_and_auto_advances() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::ListeningNotStarted, 1200)]);
        pump(&mut app, &rx, now);

        app.on_key(key(KeyCode::Char('p')), now);
        app.on_key(key(KeyCode::Enter), now); // confirm listening
        assert_eq!(app.audio_status, AudioStatus::Playing);
        assert!(app.playback.is_some());

        // Second trigger is a no-op: no dialog, no second playback
        app.on_key(key(KeyCode::Char('p')), now);
        assert!(app.modal.is_none());

        // Track ends
        let end = now + Duration::from_secs(app.paper.listening_track_secs + 1);
        app.on_tick(end);
        assert_eq!(app.session.screen, Screen::Reading);
        assert_eq!(app.audio_status, AudioStatus::Done);
        assert!(app.playback.is_none());
    }

    #[test]
    fn submit_already_used_keeps_writing_interactive() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![
            ok_status(RemoteStatus::AfterListening, 900),
            Err(ApiError::AlreadyUsed),
        ]);
        pump(&mut app, &rx, now);

        app.on_key(key(KeyCode::Char('n')), now); // reading -> writing
        assert_eq!(app.session.screen, Screen::Writing);
        app.sheet.email_text = "draft".into();

        app.on_key(ctrl('s'), now);
        app.on_key(key(KeyCode::Enter), now); // confirm submit
        pump(&mut app, &rx, now);

        assert_eq!(app.session.screen, Screen::Writing);
        assert!(!app.session.locked);
        assert!(app.modal.is_some());
        // No local state is cleared
        assert_eq!(app.sheet.email_text, "draft");
    }

    #[test]
    fn successful_submit_locks_and_ends() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![
            ok_status(RemoteStatus::AfterListening, 900),
            ok_plain(), // submit
        ]);
        pump(&mut app, &rx, now);

        app.on_key(key(KeyCode::Char('n')), now);
        app.on_key(ctrl('s'), now);
        app.on_key(key(KeyCode::Enter), now);
        pump(&mut app, &rx, now);

        assert_eq!(app.session.screen, Screen::Ended);
        assert!(app.session.locked);
        assert!(app.countdown.is_none());
    }

    #[test]
    fn time_over_locks_every_input_one_way() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::AfterListening, 5)]);
        pump(&mut app, &rx, now);

        let late = now + Duration::from_secs(6);
        app.on_tick(late);
        assert!(app.session.locked);
        let modal = app.modal.clone().expect("time over notice");
        assert_eq!(modal.title, "Time over");

        // Dismissing the notice does not unlock anything
        app.on_key(key(KeyCode::Enter), late);
        app.on_key(key(KeyCode::Char('n')), late);
        assert!(app.session.locked);
        assert_eq!(app.session.screen, Screen::Reading);

        // Repeated ticks do not re-fire the notice
        app.on_tick(late + Duration::from_secs(1));
        assert!(app.modal.is_none());
    }

    #[test]
    fn answering_questions_with_arrows_and_digits() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::AfterListening, 900)]);
        pump(&mut app, &rx, now);

        // Reading screen: select choice B on question 1 via digits
        app.on_key(key(KeyCode::Char('2')), now);
        assert_eq!(app.sheet.reading[0], Some(1));

        // Arrow cycling on question 2
        app.on_key(key(KeyCode::Down), now);
        app.on_key(key(KeyCode::Right), now);
        assert_eq!(app.sheet.reading[1], Some(0));
        app.on_key(key(KeyCode::Left), now);
        let n = app.paper.reading[1].choices.len();
        assert_eq!(app.sheet.reading[1], Some(n - 1));
    }

    #[test]
    fn gap_assignment_via_keyboard() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::AfterListening, 900)]);
        pump(&mut app, &rx, now);
        app.on_key(key(KeyCode::Char('n')), now);

        // Assign word 0 to gap 0, then move it to gap 1
        app.on_key(key(KeyCode::Enter), now);
        assert_eq!(app.sheet.gaps.gap_word(0), Some(0));
        app.on_key(key(KeyCode::Right), now);
        app.on_key(key(KeyCode::Enter), now);
        assert_eq!(app.sheet.gaps.gap_word(0), None);
        assert_eq!(app.sheet.gaps.gap_word(1), Some(0));

        // Clear it back to the bank
        app.on_key(key(KeyCode::Backspace), now);
        assert_eq!(app.sheet.gaps.gap_word(1), None);
        assert!(!app.sheet.gaps.word_in_use(0));
    }

    #[test]
    fn email_editing_goes_through_focus_toggle() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::AfterListening, 900)]);
        pump(&mut app, &rx, now);
        app.on_key(key(KeyCode::Char('n')), now);

        app.on_key(key(KeyCode::Tab), now);
        assert_eq!(app.writing_focus, WritingFocus::Email);
        for c in "Hi".chars() {
            app.on_key(key(KeyCode::Char(c)), now);
        }
        app.on_key(key(KeyCode::Enter), now);
        app.on_key(key(KeyCode::Char('!')), now);
        assert_eq!(app.sheet.email_text, "Hi\n!");

        app.on_key(key(KeyCode::Backspace), now);
        assert_eq!(app.sheet.email_text, "Hi\n");
    }

    #[test]
    fn esc_quits_only_without_modal() {
        let now = Instant::now();
        let (mut app, rx) = app_with(vec![ok_status(RemoteStatus::NotStarted, 0)]);
        pump(&mut app, &rx, now);

        app.on_key(key(KeyCode::Enter), now);
        assert!(app.modal.is_some());
        assert!(!app.on_key(key(KeyCode::Esc), now)); // closes modal
        assert!(app.modal.is_none());
        assert!(app.on_key(key(KeyCode::Esc), now)); // quits
    }
}
