use std::fmt::Write;

use crate::listing::MarketplaceItem;
use crate::resolver::ParseOutcome;

/// Renders an outcome exactly as it is printed to the console.
pub fn render_outcome(outcome: &ParseOutcome, limit: usize) -> String {
    match outcome {
        ParseOutcome::Success { items, .. } => render_items(items, limit),
        ParseOutcome::Failure { raw_response, error_detail: Some(detail) } => {
            format!("Error parsing response: {detail}\nRaw response: {raw_response}\n")
        }
        ParseOutcome::Failure { raw_response, error_detail: None } => {
            format!("Failed to extract items: {raw_response}\n")
        }
    }
}

fn render_items(items: &[MarketplaceItem], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nFirst {limit} Facebook Marketplace items (filtered results):");
    let _ = writeln!(out, "{}", "-".repeat(60));
    if items.is_empty() {
        let _ = writeln!(out, "No items found.");
        return out;
    }
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item.title);
        let _ = writeln!(out, "   Price: {}", item.price);
        let _ = writeln!(out, "   Location: {}", item.location);
        let _ = writeln!(out, "   Posted: {}", item.time_posted);
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Strategy;

    #[test]
    fn test_success_lists_items_in_order() {
        let outcome = ParseOutcome::Success {
            items: vec![
                MarketplaceItem::new("Desk", "$20", "City", "2 days"),
                MarketplaceItem::new("Monitor 27\"", "80 $", "Montréal, QC", "une semaine"),
            ],
            strategy: Strategy::KeyedItems,
        };
        let rendered = render_outcome(&outcome, 5);
        let expected = format!(
            "\nFirst 5 Facebook Marketplace items (filtered results):\n{}\n\
             1. Desk\n   Price: $20\n   Location: City\n   Posted: 2 days\n\n\
             2. Monitor 27\"\n   Price: 80 $\n   Location: Montréal, QC\n   Posted: une semaine\n\n",
            "-".repeat(60)
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_empty_success_says_so() {
        let outcome = ParseOutcome::Success { items: vec![], strategy: Strategy::KeyedItems };
        assert!(render_outcome(&outcome, 5).ends_with("No items found.\n"));
    }

    #[test]
    fn test_failure_with_detail_shows_raw_response() {
        let outcome = ParseOutcome::Failure {
            raw_response: "{\"oops\": 1}".to_string(),
            error_detail: Some("items: field required".to_string()),
        };
        assert_eq!(
            render_outcome(&outcome, 5),
            "Error parsing response: items: field required\nRaw response: {\"oops\": 1}\n"
        );
    }

    #[test]
    fn test_failure_without_detail() {
        let outcome = ParseOutcome::Failure { raw_response: String::new(), error_detail: None };
        assert_eq!(render_outcome(&outcome, 5), "Failed to extract items: \n");
    }
}
