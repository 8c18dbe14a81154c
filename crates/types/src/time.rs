//! Time-of-day normalization for the incident-time field.
//!
//! The backend expects `HH:MM:SS` with no timezone suffix. The edit form,
//! however, holds whatever the user has typed so far, which may be a partial
//! value. The policy is "don't guess": input already in `HH:MM:SS` passes
//! through, `HH:MM` is widened with `:00` seconds, and anything else is
//! treated as absent rather than rejected, so a half-typed time never blocks
//! a save; the field is simply omitted from the outbound payload.

/// A time-of-day value in canonical `HH:MM:SS` form.
///
/// Construction only succeeds through [`IncidentTime::parse`], so a held
/// value is always transmittable as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentTime(String);

impl IncidentTime {
    /// Normalizes user input into canonical `HH:MM:SS` form.
    ///
    /// Accepts `HH:MM` (widened to `HH:MM:SS`) and `HH:MM:SS` (unchanged).
    /// Components must be two digits and in range (hour 00–23, minute and
    /// second 00–59). Anything else, including well-meant shapes like
    /// `2:30 PM`, yields `None` and the caller omits the field.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hour, minute, second) = match parts.as_slice() {
            [h, m] => (*h, *m, None),
            [h, m, s] => (*h, *m, Some(*s)),
            _ => return None,
        };

        if !component_in_range(hour, 23) || !component_in_range(minute, 59) {
            return None;
        }
        if let Some(s) = second {
            if !component_in_range(s, 59) {
                return None;
            }
        }

        Some(match second {
            Some(s) => Self(format!("{hour}:{minute}:{s}")),
            None => Self(format!("{hour}:{minute}:00")),
        })
    }

    /// Returns the canonical `HH:MM:SS` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the display form truncated to `HH:MM`, the shape shown in
    /// read-only views.
    pub fn display_hm(&self) -> &str {
        &self.0[..5]
    }
}

impl std::fmt::Display for IncidentTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// True when `part` is exactly two ASCII digits forming a value `<= max`.
fn component_in_range(part: &str, max: u32) -> bool {
    if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match part.parse::<u32>() {
        Ok(value) => value <= max,
        Err(_) => false,
    }
}
