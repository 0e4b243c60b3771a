//! Named drawing persistence.
//!
//! All drawings live in a single `drawings.json` file inside a data
//! directory, as a map from drawing name to [`DrawingRecord`]. The file
//! format matches the browser storage layout, so records written by either
//! side can be read by the other.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::element::{DrawingElement, Point, DEFAULT_COLOR, DEFAULT_STROKE_WIDTH};
use crate::error::{CanvasError, CanvasResult};
use crate::vector::{Stroke, StrokeKind};

/// File name of the drawing library inside the data directory.
pub const LIBRARY_FILE: &str = "drawings.json";

/// A persisted AI stroke with its own style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGeneratedStroke {
    /// Line or curve.
    #[serde(rename = "type")]
    pub kind: StrokeKind,
    /// Stroke points.
    pub points: Vec<Point>,
    /// Stroke color as a CSS hex string.
    pub color: String,
    /// Line thickness in pixels.
    pub stroke_width: f32,
}

impl From<&Stroke> for AiGeneratedStroke {
    fn from(stroke: &Stroke) -> Self {
        Self {
            kind: stroke.kind,
            points: stroke.points.clone(),
            color: DEFAULT_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

/// When a record was saved.
///
/// Records written here carry epoch milliseconds; browser-written records
/// carry ISO-8601 text. Both are kept as found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedAt {
    /// Milliseconds since the Unix epoch.
    Millis(u64),
    /// ISO-8601 date-time text.
    Iso(String),
}

impl std::fmt::Display for SavedAt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{ms}"),
            Self::Iso(text) => f.write_str(text),
        }
    }
}

/// One saved drawing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingRecord {
    /// Committed elements in drawing order.
    pub lines: Vec<DrawingElement>,
    /// Strokes imported from a vectorizer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_strokes: Option<Vec<AiGeneratedStroke>>,
    /// When the record was saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<SavedAt>,
}

impl DrawingRecord {
    /// Record holding the given elements, without AI strokes or timestamp.
    #[must_use]
    pub fn new(lines: Vec<DrawingElement>) -> Self {
        Self {
            lines,
            ai_strokes: None,
            timestamp: None,
        }
    }

    /// Attach imported AI strokes.
    #[must_use]
    pub fn with_ai_strokes(mut self, strokes: &[Stroke]) -> Self {
        self.ai_strokes = Some(strokes.iter().map(AiGeneratedStroke::from).collect());
        self
    }
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// File-backed collection of named drawings.
///
/// # Example
///
/// ```no_run
/// use drawguide_core::{DrawingLibrary, DrawingRecord};
///
/// let library = DrawingLibrary::with_data_dir("./data")?;
/// library.save("cat", DrawingRecord::default())?;
/// assert!(library.names()?.contains(&"cat".to_string()));
/// # Ok::<(), drawguide_core::CanvasError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DrawingLibrary {
    data_dir: PathBuf,
}

impl DrawingLibrary {
    /// Open a library in `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Io`] if the directory cannot be created.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> CanvasResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Directory holding the library file.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_path(&self) -> PathBuf {
        self.data_dir.join(LIBRARY_FILE)
    }

    /// Every saved drawing. A missing library file is an empty library.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Io`] if the file cannot be read and
    /// [`CanvasError::Serialization`] if it is not valid JSON.
    pub fn load_all(&self) -> CanvasResult<BTreeMap<String, DrawingRecord>> {
        let path = self.file_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, drawings: &BTreeMap<String, DrawingRecord>) -> CanvasResult<()> {
        let json = serde_json::to_string_pretty(drawings)?;
        std::fs::write(self.file_path(), json)?;
        Ok(())
    }

    /// Save a drawing under `name`, replacing any drawing with that name.
    /// The record's timestamp is set to the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be read or written.
    pub fn save(&self, name: &str, mut record: DrawingRecord) -> CanvasResult<()> {
        let mut drawings = self.load_all()?;
        record.timestamp = Some(SavedAt::Millis(now_millis()));
        drawings.insert(name.to_string(), record);
        self.write_all(&drawings)?;
        tracing::debug!("Saved drawing '{name}' ({} total)", drawings.len());
        Ok(())
    }

    /// Load the drawing saved under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DrawingNotFound`] if there is no such drawing.
    pub fn load(&self, name: &str) -> CanvasResult<DrawingRecord> {
        self.load_all()?
            .remove(name)
            .ok_or_else(|| CanvasError::DrawingNotFound(name.to_string()))
    }

    /// Delete the drawing saved under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DrawingNotFound`] if there is no such drawing.
    pub fn delete(&self, name: &str) -> CanvasResult<()> {
        let mut drawings = self.load_all()?;
        if drawings.remove(name).is_none() {
            return Err(CanvasError::DrawingNotFound(name.to_string()));
        }
        self.write_all(&drawings)?;
        tracing::debug!("Deleted drawing '{name}'");
        Ok(())
    }

    /// Names of all saved drawings, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be read.
    pub fn names(&self) -> CanvasResult<Vec<String>> {
        Ok(self.load_all()?.into_keys().collect())
    }
}
