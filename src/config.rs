use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "bloop")]
#[command(about = "Keep a small alien fed, clean and rested in your terminal", long_about = None)]
pub struct Args {
    /// FPS cap for drawing. The simulation runs on its own timers.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Seed for the mini-game's spawn positions
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable the talk prompt, as on a platform with no speech input
    #[arg(long, default_value_t = false)]
    pub no_voice: bool,

    /// Replay the decay that would have happened while the game was closed
    #[arg(long, default_value_t = false)]
    pub catch_up: bool,

    /// Store save, settings and log here instead of the platform data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub fps_cap: u32,
    pub enable_color: bool,
    pub seed: u64,
    pub voice_enabled: bool,
    pub catch_up_offline: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            seed: 0xB100_B100_u64,
            voice_enabled: true,
            catch_up_offline: false,
        }
    }
}

impl Settings {
    /// Command-line flags win for this run only; they are not written back.
    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if args.no_voice {
            self.voice_enabled = false;
        }
        if args.catch_up {
            self.catch_up_offline = true;
        }
        self
    }
}

pub struct Paths {
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths(override_dir: Option<&Path>) -> Result<Paths> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from("com", "bloop", "Bloop")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("bloop.log"),
        data_dir: dir,
    })
}

pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
    }
    Settings::default()
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // Windows refuses to rename over an existing file.
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("replacing {}", to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_partial_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings(&path), Settings::default());

        fs::write(&path, br#"{"fps_cap": 60}"#).unwrap();
        let s = load_settings(&path);
        assert_eq!(s.fps_cap, 60);
        assert!(s.voice_enabled);

        fs::write(&path, b"nope").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn settings_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = Settings {
            seed: 99,
            enable_color: false,
            ..Settings::default()
        };
        save_settings_atomic(&path, &s).unwrap();
        assert_eq!(load_settings(&path), s);
    }

    #[test]
    fn flags_override_file_values() {
        let args = Args::parse_from(["bloop", "--fps", "12", "--no-voice", "--catch-up"]);
        let s = Settings::default().with_overrides(&args);
        assert_eq!(s.fps_cap, 12);
        assert!(!s.voice_enabled);
        assert!(s.catch_up_offline);
        assert_eq!(s.seed, Settings::default().seed);
    }

    #[test]
    fn override_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let paths = project_paths(Some(&nested)).unwrap();
        assert!(nested.is_dir());
        assert_eq!(paths.log_path, nested.join("bloop.log"));
    }
}
