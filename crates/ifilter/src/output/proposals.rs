//! Completion proposal output formatting.

use icinga_filter::filter::{Proposal, ProposalKind};
use owo_colors::OwoColorize;
use serde::Serialize;

/// JSON output structure for the propose command.
#[derive(Serialize)]
pub struct ProposalsOutput<'a> {
    pub proposals: &'a [Proposal],
}

/// Formats proposals as JSON.
pub fn format_proposals_json(proposals: &[Proposal]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ProposalsOutput { proposals })
}

/// Formats proposals as a table of proposed token and resulting query.
pub fn format_proposals_table(proposals: &[Proposal], use_colors: bool) -> String {
    if proposals.is_empty() {
        return "No proposals.\n".to_string();
    }

    let width = proposals.iter().map(|p| p.text.len()).max().unwrap_or(0);
    let mut output = String::new();
    for proposal in proposals {
        let text = format!("{:<width$}", proposal.text);
        let text = match (use_colors, proposal.kind) {
            (false, _) => text,
            (true, ProposalKind::Column) => text.blue().to_string(),
            (true, ProposalKind::Operator) => text.magenta().to_string(),
        };
        output.push_str(&format!("{text}  {}\n", proposal.query));
    }
    output
}
