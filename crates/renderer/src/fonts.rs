use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use cosmic_text::fontdb;
use crossbeam_channel::{unbounded, Receiver, Sender};
use params::{LoadedFont, ParameterStore};
use tracing::{debug, warn};

/// File extensions accepted for custom fonts.
pub const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "woff", "woff2"];

#[derive(Debug, thiserror::Error)]
pub enum FontLoadError {
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{0}' is not a font file; expected .ttf, .otf, .woff or .woff2")]
    UnsupportedExtension(String),
    #[error("'{0}' does not contain a usable font face")]
    Malformed(String),
    #[error("font loader thread failed: {0}")]
    Worker(String),
}

pub fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            FONT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Parses font bytes and reads the family name of the first face.
pub fn decode_font(source_name: &str, data: Vec<u8>) -> Result<LoadedFont, FontLoadError> {
    let mut db = fontdb::Database::new();
    db.load_font_data(data.clone());
    let family = db
        .faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        .ok_or_else(|| FontLoadError::Malformed(source_name.to_string()))?;
    Ok(LoadedFont {
        source_name: source_name.to_string(),
        family,
        data: Arc::new(data),
    })
}

pub fn load_font_file(path: &Path) -> Result<LoadedFont, FontLoadError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    if !is_font_file(path) {
        return Err(FontLoadError::UnsupportedExtension(name));
    }
    let data = fs::read(path).map_err(|source| FontLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_font(&name, data)
}

/// Decodes font files off the event-loop thread.
///
/// Every request gets its own worker; results are collected with
/// [`FontLoader::install_ready`]. Nothing is cancelled, so when two loads
/// overlap the one that finishes last wins.
#[derive(Debug)]
pub struct FontLoader {
    tx: Sender<Result<LoadedFont, FontLoadError>>,
    rx: Receiver<Result<LoadedFont, FontLoadError>>,
}

impl Default for FontLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FontLoader {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn request(&self, path: PathBuf) {
        debug!(path = %path.display(), "font load requested");
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("font-loader".into())
            .spawn(move || {
                let _ = tx.send(load_font_file(&path));
            });
        if let Err(err) = spawned {
            let _ = self.tx.send(Err(FontLoadError::Worker(err.to_string())));
        }
    }

    /// Installs every completed load into `store`, in completion order.
    /// Failures are logged and leave the current font in place. Returns the
    /// number of fonts installed.
    pub fn install_ready(&self, store: &mut ParameterStore) -> usize {
        let mut installed = 0;
        for result in self.rx.try_iter() {
            match result {
                Ok(font) => {
                    store.install_custom_font(font);
                    installed += 1;
                }
                Err(err) => warn!(error = %err, "custom font rejected"),
            }
        }
        installed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn recognises_font_extensions() {
        assert!(is_font_file(Path::new("Lobster.ttf")));
        assert!(is_font_file(Path::new("/fonts/Inter.OTF")));
        assert!(is_font_file(Path::new("a.woff2")));
        assert!(!is_font_file(Path::new("notes.txt")));
        assert!(!is_font_file(Path::new("ttf")));
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = decode_font("broken.ttf", b"definitely not a font".to_vec()).unwrap_err();
        assert!(matches!(err, FontLoadError::Malformed(name) if name == "broken.ttf"));
    }

    #[test]
    fn missing_and_wrong_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ttf");
        assert!(matches!(
            load_font_file(&missing),
            Err(FontLoadError::Read { .. })
        ));

        let text = dir.path().join("readme.txt");
        fs::write(&text, "hello").unwrap();
        assert!(matches!(
            load_font_file(&text),
            Err(FontLoadError::UnsupportedExtension(name)) if name == "readme.txt"
        ));
    }

    #[test]
    fn failed_background_load_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.otf");
        fs::write(&bogus, [0u8; 64]).unwrap();

        let loader = FontLoader::new();
        loader.request(bogus);
        let result = loader
            .rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker reports back");
        assert!(matches!(result, Err(FontLoadError::Malformed(_))));

        // Re-queue the result and let install_ready consume it.
        loader.tx.send(result).unwrap();
        let mut store = ParameterStore::default();
        let before = store.get().clone();
        assert_eq!(loader.install_ready(&mut store), 0);
        assert_eq!(store.get(), &before);
        assert!(store.custom_font().is_none());
    }

    #[test]
    fn completed_fonts_install_last_wins() {
        let loader = FontLoader::new();
        let first = LoadedFont {
            source_name: "a.ttf".into(),
            family: "Alpha".into(),
            data: Arc::new(vec![1]),
        };
        let second = LoadedFont {
            source_name: "b.ttf".into(),
            family: "Beta".into(),
            data: Arc::new(vec![2]),
        };
        loader.tx.send(Ok(first)).unwrap();
        loader.tx.send(Ok(second)).unwrap();

        let mut store = ParameterStore::default();
        assert_eq!(loader.install_ready(&mut store), 2);
        assert_eq!(store.custom_font().map(|f| f.family.as_str()), Some("Beta"));
        assert_eq!(store.get().font_family, params::CUSTOM_FONT_ID);
    }
}
