use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// API root, e.g. `http://localhost:8000/api/v1`. Relative result and
    /// archive URLs resolve against its origin.
    pub base_url: String,
    /// `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub download_dir: PathBuf,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
            connect_timeout: None,
            download_dir: PathBuf::from("downloads"),
        }
    }
}
