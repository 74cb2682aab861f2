//! Blocking HTTP source over Reddit's public JSON endpoints.
//!
//! Endpoints used:
//! - `GET /r/{community}/top.json?t=month` for thread listings
//! - `GET {permalink}.json` for comment trees
//! - `GET /api/morechildren.json` for placeholder expansion, in batches of
//!   at most 100 ids
//! - `GET /user/{name}/about.json|submitted.json|comments.json` for activity
//!
//! Listings are paginated with `after` in pages of at most 100. When a page
//! after the first fails, the items gathered so far are returned.

use std::time::Duration;

use serde_json::Value;
use threadgraph_core::{
    CommentEntry, Error, FetchError, FetchLimit, FetchResult, MoreComments, Result, SourceConfig,
    Thread, UserComment, UserProfile,
};

use crate::ParticipantSource;

const PAGE_SIZE: usize = 100;
const MORE_CHILDREN_BATCH: usize = 100;
const DELETED: &str = "[deleted]";

/// HTTP participant source.
pub struct RedditSource {
    agent: ureq::Agent,
    base_url: String,
}

impl RedditSource {
    /// Build a client from configuration.
    ///
    /// Fails only on configuration the client cannot work with; no request
    /// is issued here.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(Error::Client(format!(
                "base_url '{}' must start with http:// or https://",
                config.base_url
            )));
        }
        if config.user_agent.trim().is_empty() {
            return Err(Error::Client("user_agent must not be empty".to_string()));
        }
        let agent = ureq::AgentBuilder::new()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build();
        Ok(Self { agent, base_url })
    }

    fn get_json(&self, request: ureq::Request, op: &str) -> FetchResult<Value> {
        match request.call() {
            Ok(response) => response
                .into_json::<Value>()
                .map_err(|e| FetchError::malformed(op, e.to_string())),
            Err(ureq::Error::Status(429, response)) => {
                let retry_after = response
                    .header("retry-after")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(FetchError::exhausted(op, retry_after))
            }
            Err(ureq::Error::Status(403 | 404, _)) => Err(FetchError::not_found(op)),
            Err(ureq::Error::Status(code, _)) => {
                Err(FetchError::transient(op, format!("HTTP {}", code)))
            }
            Err(ureq::Error::Transport(t)) => Err(FetchError::transient(op, t.to_string())),
        }
    }

    fn paged(
        &self,
        path: &str,
        extra: &[(&str, &str)],
        limit: FetchLimit,
        op: &str,
    ) -> FetchResult<Vec<Value>> {
        let url = format!("{}{}", self.base_url, path);
        let mut items: Vec<Value> = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page_size = limit
                .as_option()
                .map_or(PAGE_SIZE, |n| n.saturating_sub(items.len()).min(PAGE_SIZE));
            let mut request = self
                .agent
                .get(&url)
                .query("limit", &page_size.to_string())
                .query("raw_json", "1");
            for (key, value) in extra {
                request = request.query(key, value);
            }
            if let Some(cursor) = &after {
                request = request.query("after", cursor);
            }

            let page = match self.get_json(request, op) {
                Ok(page) => page,
                Err(e) if !items.is_empty() => {
                    tracing::warn!(
                        target: "threadgraph::source",
                        op = %op,
                        fetched = items.len(),
                        error = %e,
                        "Listing page failed, keeping items fetched so far"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            let (children, next) = parse_listing(&page, op)?;
            if children.is_empty() {
                break;
            }
            items.extend(children);
            match next {
                Some(cursor) if !limit.is_reached(items.len()) => after = Some(cursor),
                _ => break,
            }
        }

        limit.truncate(&mut items);
        Ok(items)
    }

    fn absolute(&self, permalink: &str) -> String {
        absolute_permalink(&self.base_url, permalink)
    }
}

impl ParticipantSource for RedditSource {
    fn list_top_threads(&self, community: &str, limit: FetchLimit) -> FetchResult<Vec<Thread>> {
        let op = format!("listing {}", community);
        let path = format!("/r/{}/top.json", community);
        self.paged(&path, &[("t", "month")], limit, &op)?
            .iter()
            .map(|child| thread_from_link(child, &self.base_url, &op))
            .collect()
    }

    fn fetch_comments(&self, thread: &Thread) -> FetchResult<Vec<CommentEntry>> {
        let op = format!("comments {}", thread.permalink);
        let url = format!("{}.json", self.absolute(&thread.permalink).trim_end_matches('/'));
        let request = self.agent.get(&url).query("raw_json", "1");
        let value = self.get_json(request, &op)?;
        let listing = value
            .as_array()
            .and_then(|parts| parts.get(1))
            .ok_or_else(|| FetchError::malformed(&op, "expected [thread, comments] pair"))?;
        let (children, _) = parse_listing(listing, &op)?;
        Ok(parse_comment_tree(&children))
    }

    fn expand_more(&self, thread: &Thread, more: &MoreComments) -> FetchResult<Vec<CommentEntry>> {
        let op = format!("expand {} in {}", more.id, thread.permalink);
        if more.children.is_empty() {
            return Ok(Vec::new());
        }
        let link_id = thread_id_from_permalink(&thread.permalink)
            .map(|id| format!("t3_{}", id))
            .ok_or_else(|| FetchError::malformed(&op, "permalink has no thread id"))?;
        let url = format!("{}/api/morechildren.json", self.base_url);
        let mut entries = Vec::new();
        for batch in more.children.chunks(MORE_CHILDREN_BATCH) {
            let request = self
                .agent
                .get(&url)
                .query("api_type", "json")
                .query("raw_json", "1")
                .query("link_id", &link_id)
                .query("children", &batch.join(","));
            let value = self.get_json(request, &op)?;
            let things = value
                .pointer("/json/data/things")
                .and_then(Value::as_array)
                .ok_or_else(|| FetchError::malformed(&op, "missing json.data.things"))?;
            entries.extend(parse_comment_tree(things));
        }
        Ok(entries)
    }

    fn get_user(&self, username: &str) -> FetchResult<UserProfile> {
        let op = format!("user {}", username);
        let url = format!("{}/user/{}/about.json", self.base_url, username);
        let value = self.get_json(self.agent.get(&url), &op)?;
        let data = value
            .get("data")
            .ok_or_else(|| FetchError::malformed(&op, "missing data"))?;
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(username)
            .to_string();
        let suspended = data
            .get("is_suspended")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(UserProfile { name, suspended })
    }

    fn list_user_submissions(&self, username: &str, limit: FetchLimit) -> FetchResult<Vec<Thread>> {
        let op = format!("submissions of {}", username);
        let path = format!("/user/{}/submitted.json", username);
        self.paged(&path, &[], limit, &op)?
            .iter()
            .map(|child| thread_from_link(child, &self.base_url, &op))
            .collect()
    }

    fn list_user_comments(
        &self,
        username: &str,
        limit: FetchLimit,
    ) -> FetchResult<Vec<UserComment>> {
        let op = format!("comments of {}", username);
        let path = format!("/user/{}/comments.json", username);
        self.paged(&path, &[], limit, &op)?
            .iter()
            .map(|child| user_comment_from_child(child, &self.base_url, &op))
            .collect()
    }
}

/// Split a listing into its children and the `after` cursor.
fn parse_listing(value: &Value, op: &str) -> FetchResult<(Vec<Value>, Option<String>)> {
    let data = value
        .get("data")
        .ok_or_else(|| FetchError::malformed(op, "listing without data"))?;
    let children = data
        .get("children")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| FetchError::malformed(op, "listing without children"))?;
    let after = data
        .get("after")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok((children, after))
}

/// Convert listing children (`t1` comments and `more` placeholders) into a
/// comment tree. Other kinds are ignored.
fn parse_comment_tree(children: &[Value]) -> Vec<CommentEntry> {
    children
        .iter()
        .filter_map(|child| {
            let data = child.get("data")?;
            match child.get("kind").and_then(Value::as_str)? {
                "t1" => {
                    let replies = data
                        .get("replies")
                        .and_then(|r| r.pointer("/data/children"))
                        .and_then(Value::as_array)
                        .map(|nested| parse_comment_tree(nested))
                        .unwrap_or_default();
                    let author = author_of(data, "author");
                    Some(CommentEntry::with_replies(author.as_deref(), replies))
                }
                "more" => Some(CommentEntry::More(MoreComments {
                    id: str_field(data, "id").unwrap_or_default().to_string(),
                    children: data
                        .get("children")
                        .and_then(Value::as_array)
                        .map(|ids| {
                            ids.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                    count: data.get("count").and_then(Value::as_u64).unwrap_or(0) as usize,
                })),
                _ => None,
            }
        })
        .collect()
}

fn thread_from_link(child: &Value, base_url: &str, op: &str) -> FetchResult<Thread> {
    let data = child
        .get("data")
        .ok_or_else(|| FetchError::malformed(op, "link without data"))?;
    let permalink = str_field(data, "permalink")
        .ok_or_else(|| FetchError::malformed(op, "link without permalink"))?;
    let community = str_field(data, "subreddit")
        .ok_or_else(|| FetchError::malformed(op, "link without subreddit"))?;
    Ok(Thread {
        permalink: absolute_permalink(base_url, permalink),
        community: community.to_string(),
        author: author_of(data, "author"),
    })
}

fn user_comment_from_child(child: &Value, base_url: &str, op: &str) -> FetchResult<UserComment> {
    let data = child
        .get("data")
        .ok_or_else(|| FetchError::malformed(op, "comment without data"))?;
    let permalink = str_field(data, "link_permalink")
        .ok_or_else(|| FetchError::malformed(op, "comment without link_permalink"))?;
    let community = str_field(data, "subreddit")
        .ok_or_else(|| FetchError::malformed(op, "comment without subreddit"))?;
    Ok(UserComment {
        thread: Thread {
            permalink: absolute_permalink(base_url, permalink),
            community: community.to_string(),
            author: author_of(data, "link_author"),
        },
    })
}

fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

/// Deleted accounts are reported as `[deleted]`.
fn author_of(data: &Value, key: &str) -> Option<String> {
    str_field(data, key)
        .filter(|a| !a.is_empty() && *a != DELETED)
        .map(str::to_string)
}

fn absolute_permalink(base_url: &str, permalink: &str) -> String {
    if permalink.starts_with("http://") || permalink.starts_with("https://") {
        permalink.to_string()
    } else {
        format!("{}{}", base_url, permalink)
    }
}

/// Extract `{id}` from `.../comments/{id}/...`.
fn thread_id_from_permalink(permalink: &str) -> Option<&str> {
    let mut segments = permalink.split('/');
    segments.find(|s| *s == "comments")?;
    segments.next().filter(|id| !id.is_empty())
}
