//! Educational prompt building and topic classification.

/// System prompt prepended to every question
pub const SYSTEM_PROMPT: &str = r#"You are an expert educational AI assistant.
Explain concepts clearly and concisely for students.
Break down complex ideas into simple terms with examples.
Always provide:
1. A clear definition
2. Key formulas/principles
3. A short example.
Keep the total response under 400 words."#;

/// Instructions appended after the question
const ANSWER_INSTRUCTIONS: &str = "Provide a clear, educational answer that includes:
1. A concise explanation
2. Key formulas or principles (if applicable)
3. A simple example

Answer:";

/// Subject keywords, checked in order
const TOPIC_TEMPLATES: &[(&str, &[&str])] = &[
    ("mathematics", &["theorem", "formula", "equation", "proof", "calculation"]),
    ("physics", &["law", "force", "motion", "energy", "wave"]),
    ("chemistry", &["reaction", "molecule", "element", "bond"]),
    ("computer_science", &["algorithm", "data structure", "complexity", "sorting"]),
];

/// Words ignored when deriving a topic from the question itself
const STOPWORDS: &[&str] = &["what", "is", "the", "explain", "how", "why", "tell", "me", "about"];

/// Fallback topic
pub const GENERAL_TOPIC: &str = "General";

/// Build the full prompt sent to the answer backend
pub fn build_prompt(question: &str, context: Option<&str>) -> String {
    let mut prompt = format!("{}\n\n", SYSTEM_PROMPT);
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("Context: {}\n\n", context));
    }
    prompt.push_str(&format!("Question: {}\n\n", question.trim()));
    prompt.push_str(ANSWER_INSTRUCTIONS);
    prompt
}

/// Classify a question into a topic.
///
/// Known subjects win; otherwise the first three meaningful words of the
/// question, title-cased.
pub fn classify_topic(question: &str) -> String {
    let words = normalized_words(question);

    for (topic, keywords) in TOPIC_TEMPLATES {
        if keywords.iter().any(|kw| matches_keyword(&words, kw)) {
            return (*topic).to_string();
        }
    }

    let important: Vec<String> = words
        .iter()
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .take(3)
        .map(|w| title_case(w))
        .collect();

    if important.is_empty() {
        GENERAL_TOPIC.to_string()
    } else {
        important.join(" ")
    }
}

fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Single words match a token or its plural; phrases match consecutive tokens
fn matches_keyword(words: &[String], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split(' ').collect();
    if parts.len() == 1 {
        return words
            .iter()
            .any(|w| w == keyword || w.strip_suffix('s') == Some(keyword));
    }
    words
        .windows(parts.len())
        .any(|window| window.iter().zip(&parts).all(|(w, p)| w == p))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theorem_is_mathematics() {
        assert_eq!(classify_topic("What is the Pythagorean theorem?"), "mathematics");
    }

    #[test]
    fn test_keyword_plural_and_phrase() {
        assert_eq!(classify_topic("Explain Newton's laws"), "physics");
        assert_eq!(classify_topic("What is a data structure?"), "computer_science");
        assert_eq!(classify_topic("How do covalent bonds form?"), "chemistry");
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        // "lawn" is not "law"
        assert_eq!(classify_topic("How do I mow a lawn"), "Do I Mow");
    }

    #[test]
    fn test_fallback_topic_from_question() {
        assert_eq!(classify_topic("Tell me about photosynthesis in plants"), "Photosynthesis In Plants");
    }

    #[test]
    fn test_general_when_only_stopwords() {
        assert_eq!(classify_topic("What is the?"), GENERAL_TOPIC);
        assert_eq!(classify_topic(""), GENERAL_TOPIC);
    }

    #[test]
    fn test_prompt_includes_context_when_present() {
        let prompt = build_prompt("What is entropy?", Some("thermodynamics class"));
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("Context: thermodynamics class"));
        assert!(prompt.contains("Question: What is entropy?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_prompt_skips_blank_context() {
        let prompt = build_prompt("What is entropy?", Some("   "));
        assert!(!prompt.contains("Context:"));
    }
}
