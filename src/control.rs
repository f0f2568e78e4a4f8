use crate::config::{WINDOW_DEFAULT, WINDOW_MAX, WINDOW_MIN};
use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Window size control: one value, two views
// ---------------------------------------------------------------------------

/// The smoothing window as shown by the slider and the text entry.
///
/// `value` is authoritative and always within `[WINDOW_MIN, WINDOW_MAX]`.
/// `entry` is the editable text; it only feeds back into `value` on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowControl {
    value: u32,
    entry: String,
}

impl Default for WindowControl {
    fn default() -> Self {
        Self {
            value: WINDOW_DEFAULT,
            entry: WINDOW_DEFAULT.to_string(),
        }
    }
}

impl WindowControl {
    /// Value the slider shows.
    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Text buffer for the entry widget to edit in place.
    pub fn entry_mut(&mut self) -> &mut String {
        &mut self.entry
    }

    /// Slider moved: store the value and mirror it into the entry.
    pub fn set_from_slider(&mut self, value: u32) {
        self.value = value.clamp(WINDOW_MIN, WINDOW_MAX);
        self.entry = self.value.to_string();
    }

    /// Entry committed (Enter): accept an integer in range, otherwise restore.
    pub fn commit_entry(&mut self) -> Result<u32> {
        match self.entry.trim().parse::<u32>() {
            Ok(v) if (WINDOW_MIN..=WINDOW_MAX).contains(&v) => {
                self.set_from_slider(v);
                Ok(v)
            }
            _ => {
                let input = std::mem::replace(&mut self.entry, self.value.to_string());
                Err(ReportError::InvalidWindowInput {
                    input,
                    min: WINDOW_MIN,
                    max: WINDOW_MAX,
                })
            }
        }
    }

    /// Window for a run, read from the entry as typed.
    ///
    /// Only positivity is checked here; the slider range does not apply.
    pub fn window_for_run(&self) -> Result<usize> {
        match self.entry.trim().parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ReportError::InvalidWindowAtRun {
                input: self.entry.clone(),
            }),
        }
    }
}
