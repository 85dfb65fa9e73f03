//! Human readable change summaries between two versions of a movie.

use crate::catalog::MovieFields;

const SEPARATOR: &str = " | ";

fn text(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}

// Zero reads as unset, same as an absent value.
fn integer(value: &Option<i64>) -> String {
    value
        .filter(|v| *v != 0)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

// `{:?}` keeps the decimal point on whole numbers ("8.0").
fn real(value: &Option<f64>) -> String {
    value
        .filter(|v| *v != 0.0)
        .map(|v| format!("{:?}", v))
        .unwrap_or_default()
}

/// The tracked fields, in the order they appear in a summary.
fn tracked_fields(fields: &MovieFields) -> [(&'static str, String); 7] {
    [
        ("Title", text(&fields.title)),
        ("Year", integer(&fields.year)),
        ("Genre", text(&fields.genre)),
        ("Director", text(&fields.director)),
        ("Placement", text(&fields.placement)),
        ("Rating", real(&fields.rating)),
        ("Media_format", text(&fields.media_format)),
    ]
}

/// Describes what changed from `old` to `new`.
///
/// Returns an empty string when none of the tracked fields differ. Fields
/// outside the tracked set (cast, plot, poster, runtime) never show up.
pub fn compute_diff(old: &MovieFields, new: &MovieFields) -> String {
    let mut changes = Vec::new();

    for ((label, old_value), (_, new_value)) in
        tracked_fields(old).into_iter().zip(tracked_fields(new))
    {
        if old_value != new_value {
            changes.push(format!("{}: '{}' → '{}'", label, old_value, new_value));
        }
    }

    if old.is_ripped != new.is_ripped {
        changes.push(format!("Ripped: {} → {}", old.is_ripped, new.is_ripped));
    }
    if old.is_locked != new.is_locked {
        changes.push(format!("Locked: {} → {}", old.is_locked, new.is_locked));
    }

    changes.join(SEPARATOR)
}
