//! Prompt construction and response post-processing.

use quill_core::generate::StoryRequest;

/// Output tokens reserved for the title and format overhead on top of the
/// word budget.
const TOKEN_HEADROOM: u32 = 150;

/// Output tokens allowed for a round of clarifying questions.
pub const QUESTION_TOKENS: u32 = 150;

/// Words past the budget tolerated before a reply is truncated.
const WORD_TOLERANCE: usize = 120;

/// Token budget for a story of `story_size` words: a 25% margin for the
/// word-to-token ratio plus fixed headroom.
pub fn max_story_tokens(story_size: u32) -> u32 {
  story_size * 5 / 4 + TOKEN_HEADROOM
}

/// The full storytelling prompt, used once clarifying responses are in.
pub fn story_prompt(req: &StoryRequest) -> String {
  let author = req
    .author_preference
    .as_deref()
    .filter(|a| !a.is_empty())
    .unwrap_or("None");
  let framework = req
    .framework
    .as_deref()
    .filter(|f| !f.is_empty())
    .unwrap_or("None");
  let clarifying = req.clarifying_responses.as_deref().unwrap_or("");

  format!(
    "<System>\n\
     You are an expert storyteller, novelist, and narrative designer.\n\
     </System>\n\
     \n\
     <Context>\n\
     The user has provided the following details:\n\
     - Genre: {genre}\n\
     - Setting: {setting}\n\
     - Characters: {characters}\n\
     - Themes: {themes}\n\
     - Additional Plot Points: {details}\n\
     - Author to mimic: {author}\n\
     - Storytelling Framework: {framework}\n\
     - Clarifying Responses: {clarifying}\n\
     </Context>\n\
     \n\
     <Instructions>\n\
     1. Generate a rich narrative that follows advanced storytelling techniques.\n\
     2. If an author preference is provided, mimic that writing style.\n\
     3. If a storytelling framework is provided, adhere to its structure.\n\
     4. The story must be exactly or very close to {size} words. Do not exceed this word count.\n\
     5. Also, create a concise short title for the story.\n\
     Output the result in plain text in the following format:\n\
     \n\
     Title: <short title here>\n\
     ---\n\
     <story narrative here>\n\
     </Instructions>\n",
    genre = req.genre,
    setting = req.setting,
    characters = req.characters,
    themes = req.themes,
    details = req.details,
    size = req.story_size,
  )
}

/// The question-eliciting prompt, used on the first round.
pub fn questions_prompt(req: &StoryRequest) -> String {
  format!(
    "<System>\n\
     You are an expert storyteller, novelist, and narrative designer.\n\
     </System>\n\
     \n\
     <Context>\n\
     The user provided the following details:\n\
     - Genre: {genre}\n\
     - Setting: {setting}\n\
     - Characters: {characters}\n\
     - Themes: {themes}\n\
     - Additional details: {additional}\n\
     </Context>\n\
     \n\
     <Instructions>\n\
     1. Analyze the provided details and determine if further clarification is needed.\n\
     2. If clarification is needed, output a JSON object with a key \"questions\" that maps to an array of clarifying questions (each as a string).\n\
     Do not generate the final story.\n\
     </Instructions>\n\
     \n\
     Please output only the JSON object.\n",
    genre = req.genre,
    setting = req.setting,
    characters = req.characters,
    themes = req.themes,
    additional = req.additional_details,
  )
}

/// Parse `{"questions": [...]}` out of a provider reply, falling back to
/// the reply's non-empty lines when it is not valid JSON.
pub fn parse_questions(text: &str) -> Vec<String> {
  #[derive(serde::Deserialize)]
  struct Reply {
    #[serde(default)]
    questions: Vec<String>,
  }

  if let Ok(reply) = serde_json::from_str::<Reply>(text) {
    return reply.questions;
  }
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Truncate a reply that overran the word budget. Replies within
/// `WORD_TOLERANCE` words of the budget pass through untouched.
pub fn enforce_word_budget(text: &str, story_size: u32) -> String {
  let words: Vec<&str> = text.split_whitespace().collect();
  let budget = story_size as usize;
  if words.len() > budget + WORD_TOLERANCE {
    words[..budget].join(" ")
  } else {
    text.to_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn token_budget_scales_with_story_size() {
    assert_eq!(max_story_tokens(1000), 1400);
    assert_eq!(max_story_tokens(400), 650);
  }

  #[test]
  fn story_prompt_includes_every_detail() {
    let req = StoryRequest {
      genre: "Fantasy".into(),
      setting: "a drowned city".into(),
      characters: "Ines".into(),
      themes: "memory".into(),
      details: "the tide never falls".into(),
      author_preference: Some("Le Guin".into()),
      framework: Some("Hero's Journey".into()),
      story_size: 800,
      clarifying_responses: Some("melancholy tone".into()),
      ..Default::default()
    };
    let prompt = story_prompt(&req);
    assert!(prompt.contains("Genre: Fantasy"));
    assert!(prompt.contains("Author to mimic: Le Guin"));
    assert!(prompt.contains("Storytelling Framework: Hero's Journey"));
    assert!(prompt.contains("Clarifying Responses: melancholy tone"));
    assert!(prompt.contains("800 words"));
  }

  #[test]
  fn story_prompt_defaults_absent_preferences_to_none() {
    let prompt = story_prompt(&StoryRequest::default());
    assert!(prompt.contains("Author to mimic: None"));
    assert!(prompt.contains("Storytelling Framework: None"));
  }

  #[test]
  fn parses_questions_from_json() {
    let reply = r#"{"questions": ["What tone?", "How long?"]}"#;
    assert_eq!(parse_questions(reply), vec!["What tone?", "How long?"]);
  }

  #[test]
  fn falls_back_to_lines_on_invalid_json() {
    let reply = "What tone should the story have?\n\nWho narrates it?\n";
    assert_eq!(
      parse_questions(reply),
      vec!["What tone should the story have?", "Who narrates it?"]
    );
  }

  #[test]
  fn overlong_reply_is_truncated_to_budget() {
    let text = (0..200).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
    let trimmed = enforce_word_budget(&text, 50);
    assert_eq!(trimmed.split_whitespace().count(), 50);
  }

  #[test]
  fn reply_within_tolerance_passes_through() {
    let text = (0..160).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
    assert_eq!(enforce_word_budget(&text, 50), text);
  }
}
