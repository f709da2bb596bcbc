//! Table and status formatting for the command-line front end.

use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::agents::RegisteredAgent;
use crate::orchestration::{OrchestrationResult, SessionStatus, SystemStatistics};
use crate::tools::ToolInstance;

const MAX_CELL_WIDTH: usize = 40;

fn new_table<const N: usize>(header: [&str; N]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

/// Format a success rate in `[0, 1]` as a percentage.
pub fn format_percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Truncate text with ellipsis if it exceeds max length (in characters).
pub fn truncate_with_ellipsis(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Colored session status.
pub fn status_label(status: SessionStatus) -> ColoredString {
    match status {
        SessionStatus::Initializing => status.as_str().dimmed(),
        SessionStatus::Executing => status.as_str().yellow(),
        SessionStatus::Completed => status.as_str().green().bold(),
        SessionStatus::Failed => status.as_str().red().bold(),
    }
}

/// Registered tools, one row each.
pub fn tools_table(tools: &[ToolInstance]) -> Table {
    let mut table = new_table(["Id", "Name", "Category", "Uses", "Success", "Avg ms"]);
    for tool in tools {
        let stats = tool.statistics();
        table.add_row(vec![
            stats.id,
            truncate_with_ellipsis(&stats.name, MAX_CELL_WIDTH),
            stats.category.to_string(),
            stats.usage_count.to_string(),
            format_percent(stats.success_rate),
            format!("{:.1}", stats.average_execution_time_ms),
        ]);
    }
    table
}

/// Registered agents, one row each.
pub fn agents_table(agents: &[RegisteredAgent]) -> Table {
    let mut table = new_table(["Id", "Name", "Type", "Capabilities", "Sessions", "Success", "Cost"]);
    for agent in agents {
        let stats = agent.statistics();
        table.add_row(vec![
            stats.id,
            truncate_with_ellipsis(&stats.name, MAX_CELL_WIDTH),
            stats.agent_type.to_string(),
            truncate_with_ellipsis(&agent.schema().capabilities.join(", "), MAX_CELL_WIDTH),
            stats.total_sessions.to_string(),
            format_percent(stats.success_rate),
            format!("{:.2}", stats.total_cost),
        ]);
    }
    table
}

/// System statistics as metric/value rows.
pub fn statistics_table(stats: &SystemStatistics) -> Table {
    let mut table = new_table(["Metric", "Value"]);
    let rows = [
        ("Tools", stats.tools.total_tools.to_string()),
        ("Tool categories", stats.tools.categories.to_string()),
        ("Tool invocations", stats.tools.total_usage.to_string()),
        ("Tool success rate", format_percent(stats.tools.average_success_rate)),
        (
            "Most used tool",
            stats.tools.most_used_tool.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Agents", stats.agents.total_agents.to_string()),
        ("Agent sessions", stats.agents.total_sessions.to_string()),
        ("Agent success rate", format_percent(stats.agents.average_success_rate)),
        ("Agent cost", format!("{:.2}", stats.agents.total_cost)),
        (
            "Most used agent",
            stats.agents.most_used_agent.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Active sessions", stats.sessions.active.to_string()),
        ("Completed sessions", stats.sessions.completed.to_string()),
        ("Failed sessions", stats.sessions.failed.to_string()),
        ("Uptime ms", stats.uptime_ms.to_string()),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    table
}

/// Print a one-line summary of an orchestration result followed by its
/// data or error.
pub fn print_result(result: &OrchestrationResult) {
    println!(
        "{} session {} agent {} in {} ms (cost {:.2})",
        status_label(if result.success {
            SessionStatus::Completed
        } else {
            SessionStatus::Failed
        }),
        result.metadata.session_id.dimmed(),
        result.metadata.agent_used.as_deref().unwrap_or("none").cyan(),
        result.execution_time_ms,
        result.cost,
    );
    if let Some(data) = &result.data {
        println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
    }
    if let Some(error) = &result.error {
        eprintln!("   {}", error.red());
    }
}

/// Display a user-friendly error message with suggestions
pub fn display_error_with_suggestions<E: std::fmt::Display>(error: &E, context: &str) {
    eprintln!("{} {}", "Error:".red().bold(), context);
    eprintln!("   {}", error.to_string().red());

    let error_str = error.to_string().to_lowercase();
    if error_str.contains("toml") || error_str.contains("config") {
        eprintln!("{}", "Suggestions:".blue());
        eprintln!("   • Check the syntax of the configuration file");
        eprintln!("   • Agent ids may only contain alphanumerics, '_', '-', '.' or ':'");
    } else if error_str.contains("already registered") {
        eprintln!("{}", "Suggestions:".blue());
        eprintln!("   • Agent ids in the catalog must be unique");
    } else if error_str.contains("no suitable agent") {
        eprintln!("{}", "Suggestions:".blue());
        eprintln!("   • Run 'agentreg agents' to see registered capabilities");
        eprintln!("   • Add a utility agent to the catalog to act as a fallback");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::RegistryOrchestrator;

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate_with_ellipsis("abcdefghijk", 10), "abcdefg...");
        assert_eq!(truncate_with_ellipsis("ééééé", 4), "é...");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(0.6667), "66.7%");
        assert_eq!(format_percent(1.0), "100.0%");
    }

    #[test]
    fn test_status_label_text() {
        assert!(status_label(SessionStatus::Completed).to_string().contains("completed"));
        assert!(status_label(SessionStatus::Failed).to_string().contains("failed"));
    }

    #[test]
    fn test_empty_tables_have_headers() {
        let tools = tools_table(&[]).to_string();
        assert!(tools.contains("Category"));
        let agents = agents_table(&[]).to_string();
        assert!(agents.contains("Capabilities"));
    }

    #[test]
    fn test_statistics_table() {
        let orchestrator = RegistryOrchestrator::default();
        let rendered = statistics_table(&orchestrator.get_system_statistics()).to_string();
        assert!(rendered.contains("Most used agent"));
        assert!(rendered.contains("Failed sessions"));
    }
}
