//! Settings file lookup

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;

/// Name of the settings file, searched from the working directory upwards
pub const FILE_NAME: &str = "room-alloc.toml";

/// Contents of `room-alloc.toml`
#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Directory the settings file was found in
    #[serde(skip)]
    pub root: PathBuf,

    /// Number of rooms in the pool
    #[serde(default = "default_rooms")]
    pub rooms: u32,

    /// JSON file holding the request batch
    #[serde(default)]
    pub requests: PathBuf,

    /// Percentage of the pool forming the primary range
    #[serde(default = "default_primary_share")]
    pub primary_share: u8,

    /// Send rejected primaries straight to the waitlist
    #[serde(default)]
    pub single_tier: bool,
}

fn default_rooms() -> u32 {
    30
}

fn default_primary_share() -> u8 {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            rooms: default_rooms(),
            requests: PathBuf::new(),
            primary_share: default_primary_share(),
            single_tier: false,
        }
    }
}

impl Settings {
    /// Load the settings, falling back to defaults if there is no file
    ///
    /// `ROOM_ALLOC_ROOMS` and `ROOM_ALLOC_REQUESTS` override the file.
    pub fn load() -> Result<Self> {
        let mut settings = match find(&std::env::current_dir()?)? {
            Some((root, contents)) => {
                let mut settings: Settings = toml::from_str(&contents)
                    .wrap_err_with(|| format!("invalid {FILE_NAME} in {}", root.display()))?;
                settings.root = root;
                settings
            }
            None => Settings::default(),
        };

        if settings.requests.as_os_str().is_empty() {
            settings.requests = Path::join(&settings.root, "requests.json");
        } else if settings.requests.is_relative() {
            settings.requests = Path::join(&settings.root, &settings.requests);
        }

        if let Ok(v) = std::env::var("ROOM_ALLOC_ROOMS") {
            settings.rooms = v
                .parse()
                .map_err(|_| eyre!("ROOM_ALLOC_ROOMS must be a decimal u32, got {v:?}"))?;
        }
        if let Some(v) = std::env::var_os("ROOM_ALLOC_REQUESTS") {
            settings.requests = v.into();
        }

        Ok(settings)
    }
}

/// Walk up from `start` until a settings file is found
fn find(start: &Path) -> Result<Option<(PathBuf, String)>> {
    let mut path = start.to_path_buf();
    loop {
        path.push(FILE_NAME);

        match std::fs::read_to_string(&path) {
            Ok(s) => {
                path.pop();
                return Ok(Some((path, s)));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        path.pop();
        if !path.pop() {
            return Ok(None);
        }
    }
}
