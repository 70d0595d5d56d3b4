use serde_json::Value;

use crate::events::{EventSink, HarvestEvent};
use crate::types::{MissingField, PostRecord, RawPost};

const POST_LINK_BASE: &str = "https://bsky.app/profile";

/// Permalink for a post: `https://bsky.app/profile/{author}/post/{short_id}`.
pub fn post_link(author: &str, short_id: &str) -> String {
    format!("{POST_LINK_BASE}/{author}/post/{short_id}")
}

/// Final `/` segment of an `at://` URI, i.e. the record key.
pub fn short_id(uri: &str) -> Option<&str> {
    uri.rsplit('/').next().filter(|s| !s.is_empty())
}

fn non_empty_str<'v>(post: &'v Value, pointer: &str) -> Option<&'v str> {
    post.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Convert one raw post, naming the first required field it lacks.
pub fn normalize_post(post: &RawPost) -> Result<PostRecord, MissingField> {
    let author = non_empty_str(post, "/author/handle").ok_or(MissingField::AuthorHandle)?;
    let uri = non_empty_str(post, "/uri").ok_or(MissingField::Uri)?;
    let short_id = short_id(uri).ok_or(MissingField::Uri)?;
    let created_at = non_empty_str(post, "/indexedAt").ok_or(MissingField::IndexedAt)?;
    let content = post
        .pointer("/record/text")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(PostRecord {
        author: author.to_string(),
        content: content.to_string(),
        created_at: created_at.to_string(),
        post_link: post_link(author, short_id),
    })
}

/// Normalize a batch. Malformed posts are dropped and reported; the rest
/// keep their input order.
pub fn normalize(posts: &[RawPost], events: &dyn EventSink) -> Vec<PostRecord> {
    posts
        .iter()
        .enumerate()
        .filter_map(|(index, post)| match normalize_post(post) {
            Ok(record) => Some(record),
            Err(missing) => {
                events.emit(HarvestEvent::PostDropped { index, missing });
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{raw_post, RecordingSink};

    #[test]
    fn builds_permalink_from_uri_tail() {
        let post = json!({
            "uri": "at://did:plc:z72i7hdynmk6r22z27h6tvur/app.bsky.feed.post/3legkyuzjs22m",
            "author": {"handle": "witheringtales.bsky.social"},
            "record": {"text": "contentABC"},
            "indexedAt": "2023-01-01T00:00:00.000Z"
        });
        let record = normalize_post(&post).unwrap();
        assert_eq!(
            record,
            PostRecord {
                author: "witheringtales.bsky.social".into(),
                content: "contentABC".into(),
                created_at: "2023-01-01T00:00:00.000Z".into(),
                post_link: "https://bsky.app/profile/witheringtales.bsky.social/post/3legkyuzjs22m"
                    .into(),
            }
        );
    }

    #[test]
    fn missing_text_becomes_empty_content() {
        let post = json!({
            "uri": "at://did:plc:a/app.bsky.feed.post/xyz",
            "author": {"handle": "a.bsky.social"},
            "indexedAt": "2024-07-01T12:00:00Z"
        });
        assert_eq!(normalize_post(&post).unwrap().content, "");
    }

    #[test]
    fn reports_which_field_is_missing() {
        let no_author = json!({"uri": "at://x/app.bsky.feed.post/1", "indexedAt": "t"});
        assert_eq!(normalize_post(&no_author), Err(MissingField::AuthorHandle));

        let no_uri = json!({"author": {"handle": "a"}, "indexedAt": "t"});
        assert_eq!(normalize_post(&no_uri), Err(MissingField::Uri));

        let no_time = json!({"author": {"handle": "a"}, "uri": "at://x/app.bsky.feed.post/1"});
        assert_eq!(normalize_post(&no_time), Err(MissingField::IndexedAt));

        let blank_handle = json!({"author": {"handle": ""}, "uri": "12345", "indexedAt": ""});
        assert_eq!(normalize_post(&blank_handle), Err(MissingField::AuthorHandle));

        let trailing_slash = json!({"author": {"handle": "a"}, "uri": "at://x/", "indexedAt": "t"});
        assert_eq!(normalize_post(&trailing_slash), Err(MissingField::Uri));
    }

    #[test]
    fn drops_malformed_posts_and_keeps_order() {
        let posts = vec![
            raw_post("alice.bsky.social", "one", "first"),
            json!({"uri": "at://x/app.bsky.feed.post/2", "indexedAt": "t"}),
            raw_post("bob.bsky.social", "three", "third"),
            json!({"author": {"handle": "carol"}, "indexedAt": "t"}),
        ];
        let sink = RecordingSink::new();

        let records = normalize(&posts, &sink);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, "first");
        assert_eq!(records[1].content, "third");
        assert_eq!(
            sink.events(),
            vec![
                HarvestEvent::PostDropped {
                    index: 1,
                    missing: MissingField::AuthorHandle
                },
                HarvestEvent::PostDropped {
                    index: 3,
                    missing: MissingField::Uri
                },
            ]
        );
    }

    #[test]
    fn empty_batch() {
        assert!(normalize(&[], &RecordingSink::new()).is_empty());
    }
}
