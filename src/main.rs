//! Application entry point — voice assistant client.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Load the cached [`UserProfile`] (absent when signed out).
//! 4. Create the tokio runtime (multi-thread, 2 workers).
//! 5. Build the speech, intent, dispatch and account subsystems.
//! 6. Wire every event source onto one [`ControllerEvent`] channel.
//! 7. Kick off voice-catalog loading (greeting fires on `Ready`).
//! 8. Spawn the interaction controller; run until Ctrl-C.

use std::sync::Arc;

use tokio::sync::mpsc;
use voice_assistant::{
    account::{HttpAuth, LogNavigator},
    audio::{PlayOutcome, PlaybackError},
    config::AppConfig,
    dispatch::{Dispatcher, SystemOpener},
    hotkey::{parse_key, HotkeyEvent, HotkeyListener},
    intent::ApiResolver,
    profile::{DiskProfileStore, UserProfile},
    session::{new_shared_state, ControllerEvent, InteractionController},
    speech::{
        AudioSink, HttpTts, MicRecognizer, SpeakerSink, SpeechInputEvent, SpeechOutput,
        SpeechOutputEvent, Synthesizer, WhisperApi,
    },
};

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice assistant starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. User profile (signed-out state is fine; wake word and greeting
    //    are simply disabled)
    let profile = UserProfile::load().unwrap_or_else(|e| {
        log::warn!("failed to load profile ({e}); continuing signed out");
        None
    });
    match &profile {
        Some(p) => log::info!("signed in as {} (assistant: {})", p.name, p.assistant_name),
        None => log::info!("no cached profile; wake-word gating disabled"),
    }

    // 4. Tokio runtime (2 workers — recognition and synthesis each take one)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    rt.block_on(run(config, profile));
    Ok(())
}

async fn run(config: AppConfig, profile: Option<UserProfile>) {
    // 5. Channel setup — everything funnels into one controller channel.
    let (controller_tx, controller_rx) = mpsc::channel::<ControllerEvent>(32);
    let (input_tx, input_rx) = mpsc::channel::<SpeechInputEvent>(16);
    let (output_tx, output_rx) = mpsc::channel::<SpeechOutputEvent>(16);
    let (hotkey_tx, hotkey_rx) = mpsc::channel::<HotkeyEvent>(16);

    forward(input_rx, controller_tx.clone(), ControllerEvent::Input);
    forward(output_rx, controller_tx.clone(), ControllerEvent::Output);
    forward(hotkey_rx, controller_tx.clone(), |ev| match ev {
        HotkeyEvent::TalkPressed => ControllerEvent::TalkRequested,
        HotkeyEvent::LogoutPressed => ControllerEvent::LogoutRequested,
    });

    // 6. Subsystems
    let recognizer = Arc::new(MicRecognizer::new(
        Arc::new(WhisperApi::from_config(&config.recognizer)),
        config.audio.clone(),
        input_tx,
    ));

    let sink: Arc<dyn AudioSink> = match SpeakerSink::open() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            // Degrade gracefully: the assistant stays usable, replies just
            // end immediately instead of being heard.
            log::warn!("speaker unavailable ({e}); replies will be silent");
            Arc::new(SilentSink)
        }
    };
    let synthesizer = Arc::new(Synthesizer::new(
        Arc::new(HttpTts::from_config(&config.synthesis)),
        sink,
        config.synthesis.clone(),
        output_tx,
    ));

    let (assistant_name, user_name) = profile
        .as_ref()
        .map(|p| (p.assistant_name.clone(), p.name.clone()))
        .unwrap_or_else(|| ("Assistant".to_string(), "a friend".to_string()));
    let resolver = Arc::new(ApiResolver::from_config(
        &config.resolver,
        &assistant_name,
        &user_name,
    ));

    let controller = InteractionController::new(
        recognizer,
        Arc::clone(&synthesizer) as Arc<dyn SpeechOutput>,
        resolver,
        Dispatcher::new(Arc::new(SystemOpener)),
        Arc::new(HttpAuth::from_config(&config.server)),
        Arc::new(LogNavigator),
        profile,
        Arc::new(DiskProfileStore::new()),
        new_shared_state(),
    );

    // 7. Voice catalog — the startup greeting waits for its Ready event.
    synthesizer.load_voices();

    // 8. Hotkeys and the controller loop
    let talk_key = parse_key(&config.hotkey.talk_key).unwrap_or(rdev::Key::F9);
    let logout_key = parse_key(&config.hotkey.logout_key).unwrap_or(rdev::Key::F10);
    let _hotkey_listener = HotkeyListener::start(talk_key, logout_key, hotkey_tx);

    let controller_task = tokio::spawn(controller.run(controller_rx));

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            log::info!("Ctrl-C received; shutting down");
            let _ = controller_tx.send(ControllerEvent::Shutdown).await;
        }
        Err(e) => {
            log::warn!("could not listen for Ctrl-C ({e}); shutting down");
            let _ = controller_tx.send(ControllerEvent::Shutdown).await;
        }
    }

    if let Err(e) = controller_task.await {
        log::warn!("controller task failed: {e}");
    }
}

/// Spawn a task that maps every event from `rx` onto the controller channel.
fn forward<T, F>(mut rx: mpsc::Receiver<T>, tx: mpsc::Sender<ControllerEvent>, map: F)
where
    T: Send + 'static,
    F: Fn(T) -> ControllerEvent + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if tx.send(map(event)).await.is_err() {
                break;
            }
        }
    });
}

// ---------------------------------------------------------------------------
// SilentSink — fallback AudioSink when no output device is present
// ---------------------------------------------------------------------------

struct SilentSink;

impl AudioSink for SilentSink {
    fn play(
        &self,
        _audio: &[u8],
        _cancel: &std::sync::atomic::AtomicBool,
    ) -> Result<PlayOutcome, PlaybackError> {
        Ok(PlayOutcome::Completed)
    }
}
