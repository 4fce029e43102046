use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use scene_core::{update, AppState, AppViewModel, LocalFile, Msg, NiimathOperation, SessionSnapshot};
use scene_engine::{FileTokenStore, HeadlessViewer, ReqwestSceneClient, SceneApi};
use scene_logging::{scene_debug, scene_info};

use super::config::{Cli, Command};
use super::effects::EffectRunner;
use super::prompt::{Terminal, UserInteraction};
use super::{logging, persistence, render};

/// Pure state plus the runner that carries out its effects.
pub struct App<U: UserInteraction> {
    state: AppState,
    runner: EffectRunner<U>,
}

impl<U: UserInteraction> App<U> {
    pub fn new(runner: EffectRunner<U>) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.dispatch(Msg::RestoreSession(snapshot));
        self.runner.attach_restored(self.state.images());
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn runner(&self) -> &EffectRunner<U> {
        &self.runner
    }

    pub fn view(&self, now: DateTime<Utc>) -> AppViewModel {
        self.state.view(now)
    }

    /// Applies `msg` and every message its effects answer synchronously.
    fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            queue.extend(self.runner.run(effects));
        }
    }

    /// Dispatches `msg`, then feeds completions back in until nothing is in flight.
    pub fn settle(&mut self, msg: Msg) {
        self.dispatch(msg);
        while let Some(msg) = self.runner.next_message() {
            self.dispatch(msg);
        }
    }

    /// Runs the steps of one command; stops early once the session expired.
    pub fn run_steps(&mut self, steps: Vec<Msg>) {
        for msg in steps {
            if self.runner.session_expired() {
                break;
            }
            self.settle(msg);
        }
    }

    pub fn save_if_dirty(&mut self, state_dir: &Path) {
        if self.state.consume_dirty() {
            persistence::save_session(state_dir, &self.state.session_snapshot());
        }
    }
}

/// The messages a command turns into, in order.
pub fn command_steps(command: &Command, state: &AppState, now: DateTime<Local>) -> Vec<Msg> {
    match command {
        Command::Login { username, password } => vec![Msg::LoginSubmitted {
            username: username.clone(),
            password: password.clone(),
        }],
        Command::Logout => vec![Msg::LogoutClicked],
        Command::Upload { files } => vec![Msg::FilesSelected {
            files: files.iter().cloned().map(LocalFile::from_path).collect(),
            at: now.naive_local(),
        }],
        Command::Images => Vec::new(),
        Command::Select { ids } => selection_toggles(state, ids, false),
        Command::Deselect { ids } => selection_toggles(state, ids, true),
        Command::Focus { index } => vec![Msg::ImageFocused { index: *index }],
        Command::ViewMode { mode } => vec![Msg::ViewModeChanged((*mode).into())],
        Command::Tool { id } => vec![Msg::ToolSelected(Some(id.clone()))],
        Command::Op { name, args } => vec![Msg::NiimathOperationAdded(NiimathOperation::new(
            name.clone(),
            args.clone(),
        ))],
        Command::ClearOps => vec![Msg::NiimathOperationsCleared],
        Command::Process => vec![Msg::ProcessClicked],
        Command::History { search, expand } => {
            let mut steps = vec![Msg::HistoryRequested];
            if let Some(query) = search {
                steps.push(Msg::SearchChanged(query.clone()));
            }
            steps.extend(expand.iter().map(|scene_id| Msg::ExpandToggled {
                scene_id: scene_id.clone(),
            }));
            steps
        }
        Command::View { scene_id } => vec![Msg::ViewResultClicked {
            scene_id: scene_id.clone(),
        }],
        Command::Download {
            scene_id,
            files,
            all,
        } => {
            let mut steps = vec![
                Msg::HistoryRequested,
                Msg::DownloadClicked {
                    scene_id: scene_id.clone(),
                },
            ];
            if *all {
                steps.push(Msg::DownloadSelectAllToggled);
            }
            steps.extend(files.iter().map(|file_id| Msg::DownloadFileToggled {
                file_id: file_id.clone(),
            }));
            if *all || !files.is_empty() {
                steps.push(Msg::DownloadConfirmed {
                    today: now.date_naive(),
                });
            }
            steps
        }
        Command::Delete { scene_id, .. } => vec![
            Msg::HistoryRequested,
            Msg::DeleteClicked {
                scene_id: scene_id.clone(),
            },
        ],
        Command::ClearHistory { .. } => vec![Msg::HistoryRequested, Msg::DeleteAllClicked],
    }
}

/// Toggles for the listed ids whose selection differs from the target.
fn selection_toggles(state: &AppState, ids: &[u64], currently_selected: bool) -> Vec<Msg> {
    state
        .images()
        .iter()
        .filter(|image| ids.contains(&image.id) && image.selected == currently_selected)
        .map(|image| Msg::ImageSelectionToggled { image_id: image.id })
        .collect()
}

fn assume_yes(command: &Command) -> bool {
    matches!(
        command,
        Command::Delete { yes: true, .. } | Command::ClearHistory { yes: true }
    )
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Login { .. } => "login",
        Command::Logout => "logout",
        Command::Upload { .. } => "upload",
        Command::Images => "images",
        Command::Select { .. } => "select",
        Command::Deselect { .. } => "deselect",
        Command::Focus { .. } => "focus",
        Command::ViewMode { .. } => "view-mode",
        Command::Tool { .. } => "tool",
        Command::Op { .. } => "op",
        Command::ClearOps => "clear-ops",
        Command::Process => "process",
        Command::History { .. } => "history",
        Command::View { .. } => "view",
        Command::Download { .. } => "download",
        Command::Delete { .. } => "delete",
        Command::ClearHistory { .. } => "clear-history",
    }
}

pub fn run(cli: Cli) -> Result<()> {
    logging::initialize(cli.log.into(), &cli.state_dir);
    scene_info!("scene-viewer {} against {}", command_name(&cli.command), cli.api_url);

    let tokens = Arc::new(FileTokenStore::new(cli.token_path()));
    let api: Arc<dyn SceneApi> = Arc::new(
        ReqwestSceneClient::new(&cli.client_settings(), tokens)
            .context("invalid API configuration")?,
    );
    let runner = EffectRunner::new(api, Terminal::new(assume_yes(&cli.command)))
        .context("cannot start the viewer")?;

    let mut app = App::new(runner);
    if let Some(snapshot) = persistence::load_session(&cli.state_dir) {
        app.restore(snapshot);
    }

    let steps = command_steps(&cli.command, app.state(), Local::now());
    scene_debug!("{} step(s) for {}", steps.len(), command_name(&cli.command));
    app.run_steps(steps);
    app.save_if_dirty(&cli.state_dir);

    let viewer: &HeadlessViewer = app.runner().viewer();
    print!("{}", render::render(&cli.command, &app.view(Utc::now()), viewer));

    if app.runner().session_expired() {
        bail!("not logged in");
    }
    Ok(())
}
