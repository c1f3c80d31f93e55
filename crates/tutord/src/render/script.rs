//! Scene script derived from an answer.

/// Maximum scenes in one video
pub const MAX_SCENES: usize = 3;

/// Split an answer into up to [`MAX_SCENES`] paragraphs.
///
/// Paragraphs are separated by blank lines. An answer without paragraph
/// breaks becomes a single scene.
pub fn scenes_from_answer(answer: &str) -> Vec<String> {
    let normalized = answer.replace("\r\n", "\n");
    let mut scenes = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in normalized.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                scenes.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        scenes.push(current.join("\n"));
    }

    scenes.truncate(MAX_SCENES);
    scenes
}
