//=========================================================================
// Progress Log
//=========================================================================
//
// Ordered archive of loading messages plus one current line.
//
// Archiving rule:
//   publish(text, replace_last)
//     ├─ previous current was an original line → moved to archive
//     ├─ previous current was a replacement    → discarded
//     └─ text becomes current (marked replacement if replace_last)
//
// So "Loading map..." followed by "45%", "90%" (replacing) keeps the
// header in the archive and only the latest percentage as current.
//
//=========================================================================

//=== CurrentLine =========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct CurrentLine {
    text: String,
    replacement: bool,
}

//=== ProgressLog =========================================================

/// Human-readable record of loading progress.
///
/// Not synchronized by itself; shared through
/// [`super::SharedLoadState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressLog {
    archive: Vec<String>,
    current: Option<CurrentLine>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a message, archiving the previous current line if it
    /// was not itself a replacement.
    pub fn publish(&mut self, text: &str, replace_last: bool) {
        let next = CurrentLine {
            text: text.to_owned(),
            replacement: replace_last,
        };

        if let Some(previous) = self.current.replace(next) {
            if !previous.replacement {
                self.archive.push(previous.text);
            }
        }
    }

    /// The most recently published message, or `""` before the first one.
    pub fn current(&self) -> &str {
        self.current.as_ref().map_or("", |line| line.text.as_str())
    }

    pub fn archived(&self) -> &[String] {
        &self.archive
    }

    /// Archived lines followed by the current line.
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.archive
            .iter()
            .map(String::as_str)
            .chain(self.current.as_ref().map(|line| line.text.as_str()))
    }

    /// All lines joined with newlines, as drawn by a plain-text renderer.
    pub fn render_text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
