//! Rendering selection lists for the operator.

use kleanup_analyze::SelectionList;
use kleanup_ops::format_size;

/// Render a titled, numbered list as display lines.
pub fn render_list(title: &str, list: &SelectionList) -> Vec<String> {
    let mut lines = vec![String::new(), title.to_string(), "-".repeat(80)];

    for entry in list.iter() {
        lines.push(format!(
            "{}.\t({})\t{:<40}\t{}",
            entry.index,
            entry.group.matched_file_count,
            entry.group.display_path(),
            format_size(entry.group.total_size_bytes)
        ));
        if entry.is_large() {
            lines.push(format!(
                "\t\t^ large directory: {} subdirectories, review before selecting",
                entry.group.child_directory_count
            ));
        }
    }

    if list.is_empty() {
        lines.push("(none)".to_string());
    }

    lines
}
