//! Request and response shapes for the reading endpoint.
//!
//! Everything here is transient: built for one request, serialized into
//! the response, and dropped.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Inbound reading request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReadingRequest {
    /// The question the querent asked.
    #[validate(length(min = 1, message = "question cannot be empty"))]
    pub question: String,

    /// Names of the drawn cards, in draw order.
    pub cards: Vec<String>,

    /// Positional labels (e.g. "past", "future"), index-aligned with
    /// `cards`. May be shorter than `cards` or absent entirely.
    #[serde(default)]
    pub positions: Vec<String>,
}

impl ReadingRequest {
    /// Zip cards with their positional labels.
    ///
    /// A card without a matching position gets an empty label; positions
    /// beyond the number of cards are ignored.
    pub fn paired_cards(&self) -> Vec<PairedCard> {
        self.cards
            .iter()
            .enumerate()
            .map(|(i, name)| PairedCard {
                name: name.clone(),
                position: self.positions.get(i).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

/// A card name joined with its positional label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairedCard {
    pub name: String,
    pub position: String,
}

/// The normalized reading relayed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingResult {
    pub cards: Vec<CardReading>,
    pub overall: OverallSummary,
}

/// Interpretation of a single card.
///
/// Inner fields are defaulted: the provider occasionally omits one and
/// the card-level content is passed through rather than re-validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardReading {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub reading: String,
}

/// Whole-spread summary and advice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub advice: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question: &str, cards: &[&str], positions: &[&str]) -> ReadingRequest {
        ReadingRequest {
            question: question.to_string(),
            cards: cards.iter().map(|c| c.to_string()).collect(),
            positions: positions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn pairing_defaults_missing_positions_to_empty() {
        let req = request(
            "내일 시험 어떻게 될까요?",
            &["The Fool", "The Tower"],
            &["과거"],
        );

        let paired = req.paired_cards();
        assert_eq!(paired.len(), 2);
        assert_eq!(
            paired[0],
            PairedCard {
                name: "The Fool".to_string(),
                position: "과거".to_string(),
            }
        );
        assert_eq!(
            paired[1],
            PairedCard {
                name: "The Tower".to_string(),
                position: String::new(),
            }
        );
    }

    #[test]
    fn pairing_ignores_excess_positions() {
        let req = request("q", &["The Sun"], &["present", "future", "beyond"]);

        let paired = req.paired_cards();
        assert_eq!(paired.len(), 1);
        assert_eq!(paired[0].position, "present");
    }

    #[test]
    fn pairing_empty_cards_yields_empty_list() {
        let req = request("q", &[], &["past"]);
        assert!(req.paired_cards().is_empty());
    }

    #[test]
    fn empty_question_fails_validation() {
        let req = request("", &["The Fool"], &[]);
        assert!(req.validate().is_err());

        let req = request("will it rain?", &["The Fool"], &[]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn card_reading_fields_default_when_omitted() {
        let parsed: CardReading =
            serde_json::from_str(r#"{"name": "The Moon"}"#).expect("should deserialize");
        assert_eq!(parsed.name, "The Moon");
        assert!(parsed.keywords.is_empty());
        assert!(parsed.summary.is_empty());
        assert!(parsed.reading.is_empty());
    }
}
