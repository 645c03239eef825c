use crate::sheet::ScoreSheet;
use shared::Competition;

const BLANK: &str = "-";

/// Draws the sheet as a plain-text table, one row per lake.
///
/// Lakes and players follow the competition's order. Anything the sheet
/// picked up from a remote update that the snapshot does not list is
/// appended after them.
pub fn render_table(competition: &Competition, sheet: &ScoreSheet) -> String {
    let mut lakes: Vec<(&str, String)> = competition
        .lakes
        .iter()
        .map(|lake| {
            let label = format!("{} ({} min)", lake.lake_name, lake.duration.minutes());
            (lake.lake_name.as_str(), label)
        })
        .collect();
    for lake in sheet.lake_names() {
        if !lakes.iter().any(|(name, _)| *name == lake) {
            lakes.push((lake, lake.to_string()));
        }
    }

    let mut players: Vec<&str> = competition.player_names().collect();
    for player in sheet.player_names() {
        if !players.contains(&player) {
            players.push(player);
        }
    }

    let mut rows: Vec<Vec<&str>> = Vec::with_capacity(lakes.len() + 1);
    let mut header = vec!["Lake"];
    header.extend(players.iter().copied());
    rows.push(header);

    for (lake, label) in &lakes {
        let mut row = vec![label.as_str()];
        for player in &players {
            let text = match sheet.text(lake, player) {
                Some(text) if !text.trim().is_empty() => text,
                _ => BLANK,
            };
            row.push(text);
        }
        rows.push(row);
    }

    let columns = players.len() + 1;
    let widths: Vec<usize> = (0..columns)
        .map(|col| rows.iter().map(|row| row[col].chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = format!("{} - {}", competition.name, competition.date);
    if !competition.is_active() {
        out.push_str(" (completed)");
    }
    out.push('\n');

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
    }
    out
}
