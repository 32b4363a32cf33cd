//! Prompt construction for the reading request.
//!
//! The system instruction fixes the reader persona and the JSON output
//! contract; the user instruction carries the question and the enumerated
//! card list. Templates are in Korean, matching the service's audience.

use crate::models::PairedCard;
use std::fmt::Write;

/// Fixed system instruction: persona plus the exact JSON shape the model
/// must produce.
pub const SYSTEM_PROMPT: &str = r#"당신은 한국인 전문 타로 리더입니다.

사용자의 질문과 카드 정보를 기반으로 아래 JSON만 출력하세요:

{
  "cards": [
    {
      "name": "카드명",
      "position": "포지션",
      "keywords": ["키워드1", "키워드2"],
      "summary": "한두 문장 요약",
      "reading": "자세한 해석"
    }
  ],
  "overall": {
    "summary": "전체 요약",
    "advice": "조언"
  }
}
"#;

/// Build the user instruction embedding the question and the drawn cards,
/// one numbered `name (position)` entry per line.
pub fn build_user_prompt(question: &str, cards: &[PairedCard]) -> String {
    let mut card_list = String::new();
    for (idx, card) in cards.iter().enumerate() {
        let _ = writeln!(card_list, "{}. {} ({})", idx + 1, card.name, card.position);
    }

    format!(
        "[질문]\n{}\n\n[뽑힌 카드 목록]\n{}\n위 내용을 기반으로 JSON만 출력하세요.\n",
        question,
        card_list
    )
}
