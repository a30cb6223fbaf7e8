//! Interaction controller — drives the talk → listen → resolve → speak loop.
//!
//! [`InteractionController`] owns the [`SharedState`] and responds to
//! [`ControllerEvent`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Interaction flow
//!
//! ```text
//! ControllerEvent::TalkRequested
//!   └─▶ speaking? drop : input.start()
//!
//! SpeechInputEvent::Transcript(text)
//!   └─▶ wake word present?
//!         ├─ no  → discard, back to Idle
//!         └─ yes → resolver.resolve(text)          [Resolving]
//!               ├─ Ok(cmd) → output.speak(reply)   [Speaking]
//!               │            dispatcher.dispatch(cmd)
//!               └─ Err     → warn, back to Idle (nothing spoken)
//!
//! SpeechOutputEvent::UtteranceEnded
//!   └─▶ Speaking → Idle, transcript cleared
//! ```
//!
//! Two rules keep the loop well-behaved.  Recognition never starts while
//! the assistant is speaking, so the microphone cannot hear the speakers.
//! And whatever path the loop exits through, teardown stops the input and
//! cancels the output.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::account::{AuthApi, Navigator, View};
use crate::dispatch::Dispatcher;
use crate::intent::IntentResolver;
use crate::profile::{ProfileStore, UserProfile};
use crate::speech::{SpeechInput, SpeechInputEvent, SpeechOutput, SpeechOutputEvent};

use super::state::{Phase, SharedState};

// ---------------------------------------------------------------------------
// ControllerEvent
// ---------------------------------------------------------------------------

/// Everything the controller reacts to, merged onto one channel so the
/// event loop is a single `recv().await`.
#[derive(Debug)]
pub enum ControllerEvent {
    /// The user asked to talk (talk key, mic button).
    TalkRequested,
    /// Notification from the recognition subsystem.
    Input(SpeechInputEvent),
    /// Notification from the synthesis subsystem.
    Output(SpeechOutputEvent),
    /// The user asked to sign out.
    LogoutRequested,
    /// Orderly shutdown (Ctrl-C, window close).
    Shutdown,
}

// ---------------------------------------------------------------------------
// InteractionController
// ---------------------------------------------------------------------------

/// Drives the complete voice interaction loop.
///
/// Create with [`InteractionController::new`], then call
/// [`run`](Self::run) inside a tokio task.
pub struct InteractionController {
    input: Arc<dyn SpeechInput>,
    output: Arc<dyn SpeechOutput>,
    resolver: Arc<dyn IntentResolver>,
    dispatcher: Dispatcher,
    auth: Arc<dyn AuthApi>,
    navigator: Arc<dyn Navigator>,
    profile: Option<UserProfile>,
    store: Arc<dyn ProfileStore>,
    state: SharedState,
    greeted: bool,
}

impl InteractionController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input: Arc<dyn SpeechInput>,
        output: Arc<dyn SpeechOutput>,
        resolver: Arc<dyn IntentResolver>,
        dispatcher: Dispatcher,
        auth: Arc<dyn AuthApi>,
        navigator: Arc<dyn Navigator>,
        profile: Option<UserProfile>,
        store: Arc<dyn ProfileStore>,
        state: SharedState,
    ) -> Self {
        Self {
            input,
            output,
            resolver,
            dispatcher,
            auth,
            navigator,
            profile,
            store,
            state,
            greeted: false,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the controller until `rx` is closed or a `Shutdown` arrives.
    ///
    /// This is an `async fn` and should be spawned as a tokio task from
    /// `main()`.  On exit it always stops the microphone and cancels any
    /// in-flight utterance.
    pub async fn run(mut self, mut rx: mpsc::Receiver<ControllerEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                ControllerEvent::TalkRequested => self.handle_talk_requested(),
                ControllerEvent::Input(event) => self.handle_input(event).await,
                ControllerEvent::Output(event) => self.handle_output(event),
                ControllerEvent::LogoutRequested => self.handle_logout().await,
                ControllerEvent::Shutdown => break,
            }
        }

        log::info!("controller shutting down");
        self.input.stop();
        self.output.cancel_all();
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// Start a recognition session — unless the assistant is mid-utterance,
    /// in which case the request is dropped so the microphone never listens
    /// to the speakers.
    fn handle_talk_requested(&self) {
        if self.output.is_speaking() {
            log::debug!("talk request dropped: still speaking");
            return;
        }
        self.input.start();
    }

    async fn handle_input(&mut self, event: SpeechInputEvent) {
        match event {
            SpeechInputEvent::Started => {
                log::debug!("recognition started → Listening");
                let mut st = self.state.lock().unwrap();
                st.listening = true;
                st.phase = Phase::Listening;
            }
            SpeechInputEvent::Transcript(text) => {
                self.handle_transcript(text).await;
            }
            SpeechInputEvent::Ended => {
                let mut st = self.state.lock().unwrap();
                st.listening = false;
                // Resolving / Speaking phases outlive the mic session.
                if st.phase == Phase::Listening {
                    st.phase = Phase::Idle;
                }
            }
            SpeechInputEvent::Error(msg) => {
                // Recognition errors are transient; log and carry on.
                log::warn!("recognition error: {msg}");
            }
        }
    }

    /// Gate on the wake word, resolve the intent, then speak and act.
    async fn handle_transcript(&mut self, text: String) {
        let Some(profile) = self.profile.as_ref() else {
            log::debug!("transcript discarded: no signed-in profile");
            return;
        };

        if !profile.contains_wake_word(&text) {
            log::debug!("transcript discarded: no wake word in {text:?}");
            let mut st = self.state.lock().unwrap();
            if st.phase == Phase::Listening {
                st.phase = Phase::Idle;
            }
            return;
        }

        {
            let mut st = self.state.lock().unwrap();
            st.last_transcript = Some(text.clone());
            st.last_response = None;
            st.phase = Phase::Resolving;
        }

        let command = match self.resolver.resolve(&text).await {
            Ok(command) => command,
            Err(e) => {
                // Resolution failure is silent for the user: back to Idle,
                // nothing spoken.
                log::warn!("intent resolution failed: {e}");
                self.state.lock().unwrap().phase = Phase::Idle;
                return;
            }
        };

        log::debug!("resolved {:?} from {text:?}", command.kind);

        {
            let mut st = self.state.lock().unwrap();
            st.last_response = Some(command.response.clone());
            st.phase = if command.response.is_empty() {
                Phase::Idle
            } else {
                Phase::Speaking
            };
        }

        if !command.response.is_empty() {
            self.output.speak(&command.response);
        }
        self.dispatcher.dispatch(&command);
    }

    fn handle_output(&mut self, event: SpeechOutputEvent) {
        match event {
            SpeechOutputEvent::Ready => {
                // Greet exactly once, and only after the voice catalog is
                // settled so the greeting uses the selected voice.
                if self.greeted {
                    return;
                }
                self.greeted = true;
                if let Some(profile) = self.profile.as_ref() {
                    let greeting = format!(
                        "Hello {}, tap the mic and ask me something!",
                        profile.name
                    );
                    self.output.speak(&greeting);
                }
            }
            SpeechOutputEvent::UtteranceEnded { text } => {
                log::debug!("utterance ended: {text:?}");
                let mut st = self.state.lock().unwrap();
                if st.phase == Phase::Speaking {
                    st.phase = Phase::Idle;
                    st.last_transcript = None;
                }
            }
        }
    }

    /// Best-effort server logout, then the local sign-out that must always
    /// complete: drop the profile, remove the cache, reset state, navigate
    /// to the sign-in view.
    async fn handle_logout(&mut self) {
        self.input.stop();
        self.output.cancel_all();

        if let Err(e) = self.auth.logout().await {
            log::warn!("server logout failed ({e}); signing out locally anyway");
        }

        self.profile = None;
        self.store.clear();

        {
            let mut st = self.state.lock().unwrap();
            *st = Default::default();
        }

        self.navigator.goto(View::SignIn);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AuthError;
    use crate::dispatch::{DispatchError, UrlOpener};
    use crate::intent::{Command, CommandKind, ResolverError};
    use crate::session::state::new_shared_state;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Records start/stop calls; emits nothing.
    #[derive(Default)]
    struct MockInput {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl SpeechInput for MockInput {
        fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Records spoken texts and cancel calls; `speaking` is scripted.
    #[derive(Default)]
    struct MockOutput {
        spoken: Mutex<Vec<String>>,
        cancels: AtomicUsize,
        speaking: AtomicBool,
    }

    impl SpeechOutput for MockOutput {
        fn speak(&self, text: &str) {
            self.spoken.lock().unwrap().push(text.to_string());
        }
        fn cancel_all(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
        fn is_speaking(&self) -> bool {
            self.speaking.load(Ordering::SeqCst)
        }
    }

    /// Counts calls; resolves every transcript to a fixed command.
    struct MockResolver {
        calls: AtomicUsize,
        fail: bool,
        response: String,
    }

    impl MockResolver {
        fn ok() -> Arc<Self> {
            Self::with_response("Here you go.")
        }
        fn with_response(response: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
                response: response.to_string(),
            })
        }
        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
                response: String::new(),
            })
        }
    }

    #[async_trait]
    impl IntentResolver for MockResolver {
        async fn resolve(&self, transcript: &str) -> Result<Command, ResolverError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ResolverError::Timeout);
            }
            Ok(Command {
                kind: CommandKind::GoogleSearch,
                user_input: transcript.to_string(),
                response: self.response.clone(),
            })
        }
    }

    struct MockAuth {
        fail: bool,
    }

    #[async_trait]
    impl AuthApi for MockAuth {
        async fn logout(&self) -> Result<(), AuthError> {
            if self.fail {
                Err(AuthError::Timeout)
            } else {
                Ok(())
            }
        }
    }

    /// Counts cache clears without touching any filesystem.
    #[derive(Default)]
    struct MockStore {
        clears: AtomicUsize,
    }

    impl ProfileStore for MockStore {
        fn clear(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct MockNavigator {
        views: Mutex<Vec<View>>,
    }

    impl Navigator for MockNavigator {
        fn goto(&self, view: View) {
            self.views.lock().unwrap().push(view);
        }
    }

    struct NullOpener;

    impl UrlOpener for NullOpener {
        fn open(&self, _url: &str) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn nova_profile() -> UserProfile {
        UserProfile {
            name: "Asha".into(),
            assistant_name: "Nova".into(),
            assistant_image: String::new(),
            history: vec![],
        }
    }

    /// Handles to every mock, kept after the controller is consumed by
    /// `run` so tests can assert on what happened.
    struct Harness {
        input: Arc<MockInput>,
        output: Arc<MockOutput>,
        resolver: Arc<MockResolver>,
        navigator: Arc<MockNavigator>,
        store: Arc<MockStore>,
        state: SharedState,
    }

    fn make_harness(
        profile: Option<UserProfile>,
        resolver: Arc<MockResolver>,
        auth_fails: bool,
    ) -> (InteractionController, Harness) {
        let input = Arc::new(MockInput::default());
        let output = Arc::new(MockOutput::default());
        let navigator = Arc::new(MockNavigator::default());
        let store = Arc::new(MockStore::default());
        let state = new_shared_state();

        let controller = InteractionController::new(
            Arc::clone(&input) as Arc<dyn SpeechInput>,
            Arc::clone(&output) as Arc<dyn SpeechOutput>,
            Arc::clone(&resolver) as Arc<dyn IntentResolver>,
            Dispatcher::new(Arc::new(NullOpener)),
            Arc::new(MockAuth { fail: auth_fails }),
            Arc::clone(&navigator) as Arc<dyn Navigator>,
            profile,
            Arc::clone(&store) as Arc<dyn ProfileStore>,
            Arc::clone(&state),
        );

        (
            controller,
            Harness {
                input,
                output,
                resolver,
                navigator,
                store,
                state,
            },
        )
    }

    async fn run_events(controller: InteractionController, events: Vec<ControllerEvent>) {
        let (tx, rx) = mpsc::channel(16);
        for event in events {
            tx.send(event).await.unwrap();
        }
        drop(tx); // close channel so run() returns
        controller.run(rx).await;
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    /// A wake-word transcript reaches the resolver and the reply is spoken.
    #[tokio::test]
    async fn wake_word_transcript_is_resolved_and_spoken() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), false);
        run_events(
            controller,
            vec![
                ControllerEvent::Input(SpeechInputEvent::Started),
                ControllerEvent::Input(SpeechInputEvent::Transcript(
                    "hey Nova search for rust".into(),
                )),
                ControllerEvent::Input(SpeechInputEvent::Ended),
            ],
        )
        .await;

        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.output.spoken.lock().unwrap().as_slice(),
            ["Here you go."]
        );
        let st = h.state.lock().unwrap();
        assert_eq!(st.phase, Phase::Speaking);
        assert_eq!(st.last_response.as_deref(), Some("Here you go."));
    }

    /// Without the wake word the transcript is discarded before the
    /// resolver ever sees it.
    #[tokio::test]
    async fn transcript_without_wake_word_is_discarded() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), false);
        run_events(
            controller,
            vec![
                ControllerEvent::Input(SpeechInputEvent::Started),
                ControllerEvent::Input(SpeechInputEvent::Transcript(
                    "search for rust".into(),
                )),
                ControllerEvent::Input(SpeechInputEvent::Ended),
            ],
        )
        .await;

        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
        assert!(h.output.spoken.lock().unwrap().is_empty());
        assert_eq!(h.state.lock().unwrap().phase, Phase::Idle);
    }

    /// No signed-in profile means no wake word, so nothing is acted on.
    #[tokio::test]
    async fn transcript_without_profile_is_discarded() {
        let (controller, h) = make_harness(None, MockResolver::ok(), false);
        run_events(
            controller,
            vec![ControllerEvent::Input(SpeechInputEvent::Transcript(
                "hey Nova search for rust".into(),
            ))],
        )
        .await;

        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
    }

    /// A talk request while the assistant is speaking must be dropped, not
    /// queued.
    #[tokio::test]
    async fn talk_request_is_dropped_while_speaking() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), false);
        h.output.speaking.store(true, Ordering::SeqCst);

        run_events(controller, vec![ControllerEvent::TalkRequested]).await;
        assert_eq!(h.input.starts.load(Ordering::SeqCst), 0);

        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), false);
        run_events(controller, vec![ControllerEvent::TalkRequested]).await;
        assert_eq!(h.input.starts.load(Ordering::SeqCst), 1);
    }

    /// Resolver failure goes quietly back to Idle: nothing spoken, nothing
    /// dispatched.
    #[tokio::test]
    async fn resolver_failure_returns_to_idle_silently() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::failing(), false);
        run_events(
            controller,
            vec![ControllerEvent::Input(SpeechInputEvent::Transcript(
                "Nova open facebook".into(),
            ))],
        )
        .await;

        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 1);
        assert!(h.output.spoken.lock().unwrap().is_empty());
        assert_eq!(h.state.lock().unwrap().phase, Phase::Idle);
    }

    /// An empty reply is never handed to the synthesizer; the cycle ends at
    /// Idle while the resolver (and dispatch) still ran.
    #[tokio::test]
    async fn empty_reply_skips_speech() {
        let (controller, h) =
            make_harness(Some(nova_profile()), MockResolver::with_response(""), false);
        run_events(
            controller,
            vec![ControllerEvent::Input(SpeechInputEvent::Transcript(
                "Nova open facebook".into(),
            ))],
        )
        .await;

        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 1);
        assert!(h.output.spoken.lock().unwrap().is_empty());
        let st = h.state.lock().unwrap();
        assert_eq!(st.phase, Phase::Idle);
        assert_eq!(st.last_response.as_deref(), Some(""));
    }

    /// When the reply finishes, Speaking yields back to Idle and the
    /// transcript is cleared.
    #[tokio::test]
    async fn utterance_end_returns_to_idle() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), false);
        run_events(
            controller,
            vec![
                ControllerEvent::Input(SpeechInputEvent::Transcript(
                    "Nova what's up".into(),
                )),
                ControllerEvent::Output(SpeechOutputEvent::UtteranceEnded {
                    text: "Here you go.".into(),
                }),
            ],
        )
        .await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.phase, Phase::Idle);
        assert!(st.last_transcript.is_none());
        assert_eq!(st.last_response.as_deref(), Some("Here you go."));
    }

    /// The greeting is spoken once, on the first `Ready`, and only when a
    /// profile is present.
    #[tokio::test]
    async fn greeting_is_spoken_once_on_ready() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), false);
        run_events(
            controller,
            vec![
                ControllerEvent::Output(SpeechOutputEvent::Ready),
                ControllerEvent::Output(SpeechOutputEvent::Ready),
            ],
        )
        .await;

        let spoken = h.output.spoken.lock().unwrap();
        assert_eq!(
            spoken.as_slice(),
            ["Hello Asha, tap the mic and ask me something!"]
        );
    }

    #[tokio::test]
    async fn no_greeting_without_profile() {
        let (controller, h) = make_harness(None, MockResolver::ok(), false);
        run_events(
            controller,
            vec![ControllerEvent::Output(SpeechOutputEvent::Ready)],
        )
        .await;
        assert!(h.output.spoken.lock().unwrap().is_empty());
    }

    /// Logout completes locally even when the server call fails.
    #[tokio::test]
    async fn logout_signs_out_locally_when_server_fails() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), true);
        run_events(
            controller,
            vec![
                ControllerEvent::LogoutRequested,
                // Profile is gone now; this must be discarded.
                ControllerEvent::Input(SpeechInputEvent::Transcript(
                    "hey Nova search".into(),
                )),
            ],
        )
        .await;

        assert_eq!(h.navigator.views.lock().unwrap().as_slice(), [View::SignIn]);
        assert_eq!(h.store.clears.load(Ordering::SeqCst), 1);
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.state.lock().unwrap().phase, Phase::Idle);
    }

    /// Shutdown (or a closed channel) always stops the microphone and
    /// cancels any in-flight utterance.
    #[tokio::test]
    async fn teardown_stops_input_and_cancels_output() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), false);
        run_events(controller, vec![ControllerEvent::Shutdown]).await;

        assert_eq!(h.input.stops.load(Ordering::SeqCst), 1);
        assert_eq!(h.output.cancels.load(Ordering::SeqCst), 1);
    }

    /// Recognition errors are logged and swallowed; the loop keeps running.
    #[tokio::test]
    async fn recognition_error_is_not_fatal() {
        let (controller, h) = make_harness(Some(nova_profile()), MockResolver::ok(), false);
        run_events(
            controller,
            vec![
                ControllerEvent::Input(SpeechInputEvent::Started),
                ControllerEvent::Input(SpeechInputEvent::Error("no speech detected".into())),
                ControllerEvent::Input(SpeechInputEvent::Ended),
                ControllerEvent::TalkRequested,
            ],
        )
        .await;

        assert_eq!(h.state.lock().unwrap().phase, Phase::Idle);
        assert_eq!(h.input.starts.load(Ordering::SeqCst), 1);
    }
}
