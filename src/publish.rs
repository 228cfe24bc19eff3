//! Publishing: caption building and the Instagram Graph API client.
//!
//! The [`Publisher`] trait is the contract the assembler relies on: upload an
//! ordered list of slides with a caption and hashtags, get back a post id or an
//! error. Nothing is finalized unless `publish` returns `Ok`.
//!
//! ## Graph API flow
//!
//! ```text
//! one slide:   POST /{user}/media {image_url, caption}            → container
//! carousel:    POST /{user}/media {image_url, is_carousel_item}   → child (each)
//!              POST /{user}/media {media_type=CAROUSEL, children, caption} → container
//! both:        GET  /{container}?fields=status_code  until FINISHED
//!              POST /{user}/media_publish {creation_id}           → media id
//! ```
//!
//! The API fetches images by URL, so the output directory must be served at
//! `instagram.media_base_url`.

use crate::config::{InstagramConfig, PostingConfig};
use crate::content::ContentItem;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const STATUS_POLL_ATTEMPTS: u32 = 10;
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("publisher not configured: {0}")]
    NotConfigured(String),
    #[error("{step} request failed: {reason}")]
    Http { step: &'static str, reason: String },
    #[error("unexpected {step} response: {reason}")]
    Response { step: &'static str, reason: String },
    #[error("container {id} not ready: {status}")]
    NotReady { id: String, status: String },
}

pub trait Publisher {
    /// Post `slides` in order as one carousel (or a single image) and return
    /// the platform's post id.
    fn publish(
        &self,
        slides: &[PathBuf],
        caption: &str,
        hashtags: &[String],
    ) -> Result<String, PublishError>;
}

// =============================================================================
// Captions
// =============================================================================

/// Caption body for `item`, with the quoted text shortened as needed so that
/// body plus hashtags stays within `posting.caption_limit` characters.
pub fn build_caption(item: &ContentItem, posting: &PostingConfig, note: &str) -> String {
    let render = |text: &str| {
        caption_body(
            text,
            &posting.attribution,
            &item.primary_source,
            &item.grade,
            note,
            &item.category,
        )
    };

    let limit = posting.caption_limit;
    let full = render(&item.text);
    if full_caption(&full, &posting.hashtags).chars().count() <= limit {
        return full;
    }

    let overhead = full_caption(&render(""), &posting.hashtags)
        .chars()
        .count();
    let room = limit.saturating_sub(overhead);
    if room < 2 {
        return truncate_chars(&full, limit);
    }
    let kept: String = item.text.chars().take(room - 1).collect();
    render(&format!("{}…", kept.trim_end()))
}

fn caption_body(
    text: &str,
    attribution: &str,
    source: &str,
    grade: &str,
    note: &str,
    category: &str,
) -> String {
    let mut caption = format!("\"{text}\"\n\n— {attribution}\n📖 {source} ({grade})\n✓ {note}\n\n");
    let tag: String = category.chars().filter(|c| !c.is_whitespace()).collect();
    if !tag.is_empty() {
        caption.push_str(&format!("#{tag} "));
    }
    caption
}

/// Caption as posted: body, blank line, space-separated hashtags.
pub fn full_caption(caption: &str, hashtags: &[String]) -> String {
    if hashtags.is_empty() {
        caption.to_string()
    } else {
        format!("{caption}\n\n{}", hashtags.join(" "))
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// =============================================================================
// Graph API
// =============================================================================

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status_code: String,
}

pub struct GraphApiPublisher {
    agent: ureq::Agent,
    base: String,
    user_id: String,
    token: String,
    media_base_url: String,
}

impl GraphApiPublisher {
    /// Build a publisher, reading the access token from the environment.
    pub fn from_config(config: &InstagramConfig) -> Result<Self, PublishError> {
        let token = std::env::var(&config.access_token_env).unwrap_or_default();
        Self::new(config, token)
    }

    pub fn new(config: &InstagramConfig, token: String) -> Result<Self, PublishError> {
        if token.trim().is_empty() {
            return Err(PublishError::NotConfigured(format!(
                "environment variable {} is not set",
                config.access_token_env
            )));
        }
        if config.user_id.trim().is_empty() {
            return Err(PublishError::NotConfigured(
                "instagram.user_id is empty".into(),
            ));
        }
        if config.media_base_url.trim().is_empty() {
            return Err(PublishError::NotConfigured(
                "instagram.media_base_url is empty".into(),
            ));
        }
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();
        Ok(Self {
            agent,
            base: config.graph_api_base.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            token,
            media_base_url: config.media_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Public URL of a rendered slide.
    fn media_url(&self, slide: &Path) -> Result<String, PublishError> {
        let name = slide
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PublishError::Response {
                step: "media",
                reason: format!("slide path has no file name: {}", slide.display()),
            })?;
        Ok(format!("{}/{}", self.media_base_url, name))
    }

    fn post_form(
        &self,
        step: &'static str,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<String, PublishError> {
        let url = format!("{}/{}", self.base, path);
        let mut fields: Vec<(&str, &str)> = form.to_vec();
        fields.push(("access_token", self.token.as_str()));
        let response = self
            .agent
            .post(&url)
            .send_form(fields)
            .map_err(|err| PublishError::Http {
                step,
                reason: err.to_string(),
            })?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|err| PublishError::Http {
                step,
                reason: err.to_string(),
            })?;
        let parsed: IdResponse =
            serde_json::from_str(&body).map_err(|err| PublishError::Response {
                step,
                reason: format!("{err}: {body}"),
            })?;
        Ok(parsed.id)
    }

    fn container_status(&self, id: &str) -> Result<String, PublishError> {
        let url = format!("{}/{}", self.base, id);
        let response = self
            .agent
            .get(&url)
            .query("fields", "status_code")
            .query("access_token", &self.token)
            .call()
            .map_err(|err| PublishError::Http {
                step: "status",
                reason: err.to_string(),
            })?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|err| PublishError::Http {
                step: "status",
                reason: err.to_string(),
            })?;
        let parsed: StatusResponse =
            serde_json::from_str(&body).map_err(|err| PublishError::Response {
                step: "status",
                reason: format!("{err}: {body}"),
            })?;
        Ok(parsed.status_code)
    }

    fn wait_until_ready(&self, id: &str) -> Result<(), PublishError> {
        let mut status = String::new();
        for attempt in 0..STATUS_POLL_ATTEMPTS {
            status = self.container_status(id)?;
            match status.as_str() {
                "FINISHED" => return Ok(()),
                "ERROR" | "EXPIRED" => break,
                _ => {
                    debug!(id, attempt, status = %status, "container not ready");
                    std::thread::sleep(STATUS_POLL_INTERVAL);
                }
            }
        }
        Err(PublishError::NotReady {
            id: id.to_string(),
            status,
        })
    }
}

impl Publisher for GraphApiPublisher {
    fn publish(
        &self,
        slides: &[PathBuf],
        caption: &str,
        hashtags: &[String],
    ) -> Result<String, PublishError> {
        let caption = full_caption(caption, hashtags);
        let media_path = format!("{}/media", self.user_id);

        let container = match slides {
            [] => {
                return Err(PublishError::Response {
                    step: "media",
                    reason: "no slides to publish".into(),
                });
            }
            [single] => {
                let image_url = self.media_url(single)?;
                self.post_form(
                    "media",
                    &media_path,
                    &[("image_url", &image_url), ("caption", &caption)],
                )?
            }
            many => {
                let mut children = Vec::with_capacity(many.len());
                for slide in many {
                    let image_url = self.media_url(slide)?;
                    let child = self.post_form(
                        "carousel item",
                        &media_path,
                        &[("image_url", &image_url), ("is_carousel_item", "true")],
                    )?;
                    debug!(child = %child, slide = %slide.display(), "created carousel item");
                    children.push(child);
                }
                let children = children.join(",");
                self.post_form(
                    "carousel",
                    &media_path,
                    &[
                        ("media_type", "CAROUSEL"),
                        ("children", &children),
                        ("caption", &caption),
                    ],
                )?
            }
        };

        self.wait_until_ready(&container)?;
        let media_id = self.post_form(
            "publish",
            &format!("{}/media_publish", self.user_id),
            &[("creation_id", &container)],
        )?;
        info!(media_id = %media_id, slides = slides.len(), "published");
        Ok(media_id)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::item_with_text;
    use std::sync::Mutex;

    /// Mock publisher that records calls instead of posting.
    #[derive(Default)]
    pub struct MockPublisher {
        pub fail: bool,
        pub calls: Mutex<Vec<(Vec<PathBuf>, String, Vec<String>)>>,
    }

    impl MockPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn get_calls(&self) -> Vec<(Vec<PathBuf>, String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Publisher for MockPublisher {
        fn publish(
            &self,
            slides: &[PathBuf],
            caption: &str,
            hashtags: &[String],
        ) -> Result<String, PublishError> {
            self.calls
                .lock()
                .unwrap()
                .push((slides.to_vec(), caption.to_string(), hashtags.to_vec()));
            if self.fail {
                return Err(PublishError::Http {
                    step: "media",
                    reason: "mock failure".into(),
                });
            }
            Ok(format!("mock-{}", self.calls.lock().unwrap().len()))
        }
    }

    const NOTE: &str = "Verified from 2+ authentic sources";

    // =========================================================================
    // Captions
    // =========================================================================

    #[test]
    fn caption_layout() {
        let item = item_with_text("bukhari", "1", "Actions are judged by intentions.")
            .with_category("Intention")
            .with_sources("Sahih al-Bukhari 1", "Sahih Muslim 1907");
        let caption = build_caption(&item, &PostingConfig::default(), NOTE);
        assert_eq!(
            caption,
            "\"Actions are judged by intentions.\"\n\n\
             — Prophet Muhammad ﷺ\n\
             📖 Sahih al-Bukhari 1 (Sahih)\n\
             ✓ Verified from 2+ authentic sources\n\n\
             #Intention "
        );
    }

    #[test]
    fn category_tag_drops_spaces() {
        let item = item_with_text("bukhari", "1", "t").with_category("Helping Others");
        let caption = build_caption(&item, &PostingConfig::default(), NOTE);
        assert!(caption.ends_with("#HelpingOthers "));
    }

    #[test]
    fn full_caption_appends_hashtags() {
        let tags = vec!["#A".to_string(), "#B".to_string()];
        assert_eq!(full_caption("body", &tags), "body\n\n#A #B");
        assert_eq!(full_caption("body", &[]), "body");
    }

    #[test]
    fn long_caption_is_shortened_to_limit() {
        let item = item_with_text("bukhari", "1", &"word ".repeat(1000));
        let posting = PostingConfig::default();
        let caption = build_caption(&item, &posting, NOTE);
        let posted = full_caption(&caption, &posting.hashtags);

        assert!(posted.chars().count() <= posting.caption_limit);
        assert!(caption.contains("…\"\n\n— Prophet Muhammad ﷺ"));
        assert!(caption.starts_with("\"word word"));
    }

    #[test]
    fn tiny_limit_hard_truncates() {
        let item = item_with_text("bukhari", "1", "some text");
        let posting = PostingConfig {
            caption_limit: 10,
            ..PostingConfig::default()
        };
        assert_eq!(build_caption(&item, &posting, NOTE).chars().count(), 10);
    }

    // =========================================================================
    // Graph API configuration
    // =========================================================================

    fn configured() -> InstagramConfig {
        InstagramConfig {
            user_id: "17841400000000000".into(),
            media_base_url: "https://cdn.example.com/slides/".into(),
            ..InstagramConfig::default()
        }
    }

    #[test]
    fn missing_token_is_not_configured() {
        assert!(matches!(
            GraphApiPublisher::new(&configured(), "  ".into()),
            Err(PublishError::NotConfigured(_))
        ));
    }

    #[test]
    fn missing_user_id_is_not_configured() {
        let config = InstagramConfig {
            user_id: String::new(),
            ..configured()
        };
        assert!(matches!(
            GraphApiPublisher::new(&config, "token".into()),
            Err(PublishError::NotConfigured(_))
        ));
    }

    #[test]
    fn missing_media_base_url_is_not_configured() {
        let config = InstagramConfig {
            media_base_url: String::new(),
            ..configured()
        };
        assert!(matches!(
            GraphApiPublisher::new(&config, "token".into()),
            Err(PublishError::NotConfigured(_))
        ));
    }

    #[test]
    fn media_url_joins_file_name() {
        let publisher = GraphApiPublisher::new(&configured(), "token".into()).unwrap();
        let url = publisher
            .media_url(Path::new("/srv/output/muslim_251b_slide_02.png"))
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/slides/muslim_251b_slide_02.png");
    }

    #[test]
    fn publishing_nothing_is_rejected() {
        let publisher = GraphApiPublisher::new(&configured(), "token".into()).unwrap();
        assert!(matches!(
            publisher.publish(&[], "caption", &[]),
            Err(PublishError::Response { .. })
        ));
    }

    #[test]
    fn mock_records_calls() {
        let publisher = MockPublisher::new();
        let id = publisher
            .publish(&[PathBuf::from("a.png")], "cap", &["#x".to_string()])
            .unwrap();
        assert_eq!(id, "mock-1");
        assert_eq!(publisher.get_calls()[0].1, "cap");
        assert!(MockPublisher::failing().publish(&[], "c", &[]).is_err());
    }
}
