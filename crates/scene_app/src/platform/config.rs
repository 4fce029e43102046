use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use scene_core::ViewMode;
use scene_engine::{ClientSettings, DEFAULT_API_URL};

use super::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "scene-viewer")]
#[command(about = "Upload, process and review medical image scenes", long_about = None)]
pub struct Cli {
    /// API root of the scene backend
    #[arg(long, env = "SCENE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Where the session, access token and log file live
    #[arg(long, default_value = ".scene_viewer")]
    pub state_dir: PathBuf,

    /// Target directory for downloaded results
    #[arg(long, default_value = "downloads")]
    pub download_dir: PathBuf,

    /// Per-request timeout; requests wait indefinitely when omitted
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogArg::File)]
    pub log: LogArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Exchange credentials for an access token
    Login {
        username: String,
        #[arg(long, env = "SCENE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored access token
    Logout,
    /// Attach local files and create a scene from them
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List attached local images
    Images,
    /// Mark local images for processing
    Select {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Unmark local images
    Deselect {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Show only the image at this position in the viewer
    Focus { index: usize },
    /// Change the viewer layout
    ViewMode {
        #[arg(value_enum)]
        mode: ViewModeArg,
    },
    /// Choose the processing tool
    Tool { id: String },
    /// Append a niimath operation, e.g. `op -add 2`
    Op {
        #[arg(allow_hyphen_values = true)]
        name: String,
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Remove all niimath operations
    ClearOps,
    /// Submit the selected images for processing
    Process,
    /// Show the processing history
    History {
        #[arg(long)]
        search: Option<String>,
        /// Show details for these scene ids
        #[arg(long = "expand")]
        expand: Vec<String>,
    },
    /// Load a completed scene's results into the viewer
    View { scene_id: String },
    /// Download files of a completed scene
    Download {
        scene_id: String,
        /// File ids as listed by the dialog, e.g. `a-processed`
        #[arg(long = "file")]
        files: Vec<String>,
        #[arg(long, conflicts_with = "files")]
        all: bool,
    },
    /// Delete one failed scene
    Delete {
        scene_id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Delete the whole processing history
    ClearHistory {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogArg {
    File,
    Terminal,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::File => LogDestination::File,
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::Both => LogDestination::Both,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewModeArg {
    Axial,
    Coronal,
    Sagittal,
    Multi,
    Render,
}

impl From<ViewModeArg> for ViewMode {
    fn from(arg: ViewModeArg) -> Self {
        match arg {
            ViewModeArg::Axial => ViewMode::Axial,
            ViewModeArg::Coronal => ViewMode::Coronal,
            ViewModeArg::Sagittal => ViewMode::Sagittal,
            ViewModeArg::Multi => ViewMode::Multi,
            ViewModeArg::Render => ViewMode::Render,
        }
    }
}

impl Cli {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_url.clone(),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            connect_timeout: None,
            download_dir: self.download_dir.clone(),
        }
    }

    pub fn token_path(&self) -> PathBuf {
        self.state_dir.join("access_token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_timeout() {
        let cli = Cli::try_parse_from(["scene-viewer", "history"]).unwrap();
        let settings = cli.client_settings();
        assert_eq!(settings.request_timeout, None);
        assert_eq!(cli.token_path(), PathBuf::from(".scene_viewer/access_token"));
        assert_eq!(cli.log, LogArg::File);
    }

    #[test]
    fn operations_accept_leading_dashes() {
        let cli = Cli::try_parse_from(["scene-viewer", "op", "-add", "2"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Op {
                name: "-add".into(),
                args: vec!["2".into()],
            }
        );
    }

    #[test]
    fn download_all_conflicts_with_file_list() {
        let parsed = Cli::try_parse_from([
            "scene-viewer",
            "download",
            "s1",
            "--all",
            "--file",
            "a-original",
        ]);
        assert!(parsed.is_err());
    }
}
