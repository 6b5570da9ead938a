//! Plain-text views of the policy and the evidence map.

use gridpeak::observer::{EvidenceSnapshot, PolicySnapshot};

// Dark to bright.
const RAMP: &[u8] = b" .:-=+*#%@";

/// One arrow per open cell, blanks for walls, tab separated.
pub fn render_policy(snap: &PolicySnapshot) -> String {
    let mut s = String::new();
    for row in &snap.actions {
        for cell in row {
            match cell {
                Some(a) => s.push(a.arrow()),
                None => s.push(' '),
            }
            s.push('\t');
        }
        s.push('\n');
    }
    s
}

/// Grayscale heat map of the combined evidence surface, scaled min..max.
/// The current argmax is marked with `X`.
pub fn render_evidence(snap: &EvidenceSnapshot) -> String {
    let lo = snap.combined.min();
    let hi = snap.combined.max();
    let span = hi - lo;
    let top = (RAMP.len() - 1) as f64;

    let mut s = String::new();
    for (row, values) in snap.combined.rows().enumerate() {
        for (col, &v) in values.iter().enumerate() {
            if row == snap.argmax.row && col == snap.argmax.col {
                s.push('X');
                continue;
            }
            let level = if span > 0.0 && span.is_finite() {
                (((v - lo) / span) * top).round().clamp(0.0, top) as usize
            } else {
                0
            };
            s.push(RAMP[level] as char);
        }
        s.push('\n');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpeak::prelude::*;

    #[test]
    fn policy_has_a_line_per_row_and_blank_walls() {
        let table = ValueTable::new(QConfig::default(), 1);
        let snap = PolicySnapshot::capture(&Grid::two_rooms(), &table);
        let text = render_policy(&snap);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), HEIGHT);
        assert!(lines[0].chars().all(|c| c == ' ' || c == '\t'));
        // Untrained table: every open cell points left.
        assert_eq!(lines[1].chars().filter(|&c| c == '\u{2190}').count(), 10);
        assert_eq!(lines[3].chars().filter(|&c| c == '\u{2190}').count(), 11);
    }

    #[test]
    fn evidence_marks_argmax_and_is_rectangular() {
        let mut db = DensityAccumulator::new(DensityConfig::default()).unwrap();
        db.update(vec![Position::new(5, 10), Position::new(5, 11)], true);
        let snap = EvidenceSnapshot::capture(&db);
        let text = render_evidence(&snap);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), HEIGHT);
        assert!(lines.iter().all(|l| l.chars().count() == WIDTH));
        assert_eq!(
            lines[snap.argmax.row].chars().nth(snap.argmax.col),
            Some('X')
        );
    }

    #[test]
    fn flat_surface_renders_dark() {
        let db = DensityAccumulator::new(DensityConfig::default()).unwrap();
        let snap = EvidenceSnapshot::capture(&db);
        let text = render_evidence(&snap);
        assert_eq!(text.chars().filter(|&c| c == 'X').count(), 1);
        assert!(text.chars().all(|c| c == ' ' || c == 'X' || c == '\n'));
    }
}
