//! Prompt selection and splitting of generated text into posts

use std::sync::OnceLock;

use regex::Regex;

/// Prompts longer than this (in characters) ask for a whole thread
pub const THREAD_PROMPT_THRESHOLD: usize = 50;

pub const THREAD_SYSTEM_PROMPT: &str = "You are an expert at creating engaging Twitter/X threads. Create a thread of 10-15 tweets that are concise, engaging, and shareable. Each tweet should be under 280 characters and build on the previous one. Mark each individual tweet with a number (e.g., 'Tweet 1:').";

pub const SINGLE_SYSTEM_PROMPT: &str = "You are an expert at creating engaging Twitter/X posts. Create a single tweet that is concise, engaging, and shareable. The tweet should be under 280 characters.";

pub fn wants_thread(prompt: &str) -> bool {
    prompt.chars().count() > THREAD_PROMPT_THRESHOLD
}

/// Full text sent to the model: system prompt, blank line, user prompt
pub fn compose_prompt(prompt: &str) -> String {
    let system = if wants_thread(prompt) {
        THREAD_SYSTEM_PROMPT
    } else {
        SINGLE_SYSTEM_PROMPT
    };
    format!("{}\n\n{}", system, prompt)
}

fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| {
        Regex::new(r"(?m)Tweet \d+:|^\d+/\d+:|\n\n").expect("Invalid separator regex")
    })
}

/// Turn model output into post bodies
///
/// Thread output is split on `Tweet N:` markers, `N/M:` markers at the start
/// of a line and blank lines; pieces are trimmed and empty ones dropped.
/// Single-post output is returned trimmed, as exactly one element.
pub fn split_generated(text: &str, thread: bool) -> Vec<String> {
    if !thread {
        return vec![text.trim().to_string()];
    }

    separator()
        .split(text)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// File name for the `n`-th generated image of a prompt (zero-based)
///
/// Built from the second to fifth words of the prompt joined with `-`.
pub fn image_file_name(prompt: &str, n: usize) -> String {
    let stem: String = prompt
        .split(' ')
        .skip(1)
        .take(4)
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect();
    let stem = if stem.trim_matches('-').is_empty() {
        "image".to_string()
    } else {
        stem
    };

    if n == 0 {
        format!("{}.png", stem)
    } else {
        format!("{}-{}.png", stem, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_prompt_is_single_post() {
        assert!(!wants_thread("Tell me about cats"));
        assert!(compose_prompt("Tell me about cats").starts_with(SINGLE_SYSTEM_PROMPT));

        let posts = split_generated("  Cats rule.\n\nDogs drool.  ", false);
        assert_eq!(posts, vec!["Cats rule.\n\nDogs drool."]);
    }

    #[test]
    fn test_long_prompt_is_thread() {
        let prompt = "a".repeat(120);
        assert!(wants_thread(&prompt));
        assert!(compose_prompt(&prompt).starts_with(THREAD_SYSTEM_PROMPT));
        assert!(compose_prompt(&prompt).ends_with(&format!("\n\n{}", prompt)));

        assert!(!wants_thread(&"a".repeat(50)));
        assert!(wants_thread(&"a".repeat(51)));
    }

    #[test]
    fn test_split_on_tweet_markers() {
        let text = "Tweet 1: Cats are great.\n\nTweet 2: They sleep a lot.\nTweet 3: The end.";
        assert_eq!(
            split_generated(text, true),
            vec!["Cats are great.", "They sleep a lot.", "The end."]
        );
    }

    #[test]
    fn test_split_on_fraction_markers_at_line_start() {
        let text = "1/3: First\n2/3: Second\n3/3: Third (see 1/2: inline stays)";
        assert_eq!(
            split_generated(text, true),
            vec!["First", "Second", "Third (see 1/2: inline stays)"]
        );
    }

    #[test]
    fn test_split_on_blank_lines_and_drop_empty() {
        let text = "\n\nOne\n\n\n\nTwo\n\n";
        assert_eq!(split_generated(text, true), vec!["One", "Two"]);
    }

    #[test]
    fn test_image_file_name() {
        assert_eq!(
            image_file_name("A cat wearing a tiny hat on the moon", 0),
            "cat-wearing-a-tiny.png"
        );
        assert_eq!(image_file_name("A cat wearing", 2), "cat-wearing-2.png");
        assert_eq!(image_file_name("sunset", 0), "image.png");
        assert_eq!(image_file_name("a ../../etc", 0), "....etc.png");
    }
}
