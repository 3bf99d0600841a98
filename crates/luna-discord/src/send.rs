use serenity::builder::{CreateAllowedMentions, CreateMessage};
use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};

/// Maximum characters per Discord message (2000 is the limit; we use 1950 for safety).
const CHUNK_MAX: usize = 1950;

/// Split `text` into chunks of at most [`CHUNK_MAX`] bytes, preferring
/// splits on whitespace/newline boundaries to avoid cutting words mid-way.
pub fn split_chunks(text: &str) -> Vec<String> {
    if text.len() <= CHUNK_MAX {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.len() > CHUNK_MAX {
        let mut end = CHUNK_MAX;
        while !remaining.is_char_boundary(end) {
            end -= 1;
        }

        // Try to split on the last newline within the window.
        let window = &remaining[..end];
        let split_at = match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(0) | None => end,
            Some(i) => i,
        };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}

/// Reply to `reply_to` without pinging its author.
///
/// Only the first chunk is threaded as a reply; the rest follow as plain
/// messages in the same channel.
pub async fn send_reply(
    http: &Http,
    channel_id: ChannelId,
    reply_to: MessageId,
    text: &str,
) -> Result<(), serenity::Error> {
    let mut chunks = split_chunks(text).into_iter();

    if let Some(first) = chunks.next() {
        let msg = CreateMessage::new()
            .content(first)
            .reference_message((channel_id, reply_to))
            .allowed_mentions(CreateAllowedMentions::new().replied_user(false));
        channel_id.send_message(http, msg).await?;
    }

    for chunk in chunks {
        channel_id.say(http, &chunk).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_single_chunk() {
        let chunks = split_chunks("Hello, world!");
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn long_text_splits_on_newline() {
        let line = "a".repeat(1000);
        let text = format!("{}\n{}", line, line);
        let chunks = split_chunks(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], line);
        assert_eq!(chunks[1], line);
    }

    #[test]
    fn very_long_word_still_splits() {
        let text = "x".repeat(4000);
        let chunks = split_chunks(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX);
        }
        assert_eq!(chunks.concat().len(), 4000);
    }

    #[test]
    fn multibyte_text_never_splits_inside_a_char() {
        // The leading "a" shifts the 3-byte chars so byte 1950 lands mid-char.
        let text = format!("a{}", "\u{2603}".repeat(1500));
        let chunks = split_chunks(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX);
        }
        assert_eq!(chunks.concat(), text);
    }
}
