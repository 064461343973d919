use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::paths;

/// Where the Tesseract executable and its language data live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract use its compiled-in tessdata location.
    pub tessdata: Option<PathBuf>,
}

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

/// Per-user directory for a Tesseract copy dedicated to this tool.
pub fn get_user_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("automining")
        .join("tesseract")
}

fn install_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![paths::get_tesseract_dir(), get_user_tesseract_dir()];
    if cfg!(windows) {
        dirs.push(PathBuf::from(r"C:\Program Files\Tesseract-OCR"));
        dirs.push(PathBuf::from(r"C:\Program Files (x86)\Tesseract-OCR"));
    } else {
        dirs.push(PathBuf::from("/usr/local/bin"));
        dirs.push(PathBuf::from("/opt/homebrew/bin"));
        dirs.push(PathBuf::from("/usr/bin"));
    }
    dirs
}

fn tessdata_near(dir: &Path) -> Option<PathBuf> {
    [dir.join("tessdata"), paths::get_exe_dir().join("tessdata")]
        .into_iter()
        .find(|candidate| candidate.is_dir())
}

/// Returns the first directory in `dirs` that contains a Tesseract executable.
pub fn find_in_dirs(dirs: &[PathBuf]) -> Option<TesseractPaths> {
    dirs.iter().find_map(|dir| {
        let executable = dir.join(EXECUTABLE_NAME);
        executable.is_file().then(|| TesseractPaths {
            tessdata: tessdata_near(dir),
            executable,
        })
    })
}

fn on_system_path() -> bool {
    Command::new(EXECUTABLE_NAME)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Finds an installed Tesseract. Never downloads or installs anything.
///
/// Looks next to the executable, in the per-user data directory, in the
/// usual install locations and finally on `PATH`.
pub fn locate_tesseract() -> Result<TesseractPaths> {
    if let Some(found) = find_in_dirs(&install_dirs()) {
        tracing::info!("Tesseract found at: {}", found.executable.display());
        return Ok(found);
    }

    if on_system_path() {
        tracing::info!("Found Tesseract in system PATH");
        return Ok(TesseractPaths {
            executable: PathBuf::from(EXECUTABLE_NAME),
            tessdata: tessdata_near(paths::get_exe_dir()),
        });
    }

    Err(anyhow!(
        "Tesseract not found. Install it or copy it to {}",
        paths::get_tesseract_dir().display()
    ))
}
