use std::time::{Duration, Instant};

fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();
    let days = total_seconds / (24 * 3600);
    let hours = (total_seconds % (24 * 3600)) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut result = Vec::new();
    let mut started = false;

    if days > 0 {
        result.push(format!("{}d", days));
        started = true;
    }
    if hours > 0 || started {
        result.push(format!("{}h", hours));
        started = true;
    }
    if minutes > 0 || started {
        result.push(format!("{}m", minutes));
    }
    result.push(format!("{}s", seconds));

    result.join(" ")
}

pub fn print_recall_duration(recall_duration: Duration) {
    let duration = chrono::Duration::from_std(recall_duration).unwrap_or_default();
    println!("Duration: {}", format_duration(duration));
}

pub fn print_summary(session_start: Instant, session_recall: Duration, reviewed_cards_count: u32) {
    if reviewed_cards_count > 0 {
        let session_duration = chrono::Duration::from_std(session_start.elapsed()).unwrap_or_default();
        let session_recall = chrono::Duration::from_std(session_recall).unwrap_or_default();
        println!();
        println!("Total Session Duration: {}", format_duration(session_duration));
        println!("Total Recall Duration:  {}", format_duration(session_recall));
        println!("Total Cards Reviewed:   {:?}", reviewed_cards_count);
    }
}
