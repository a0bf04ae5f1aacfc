//! The real backend: a presentation reached over HTTP. Requests and
//! responses are plain JSON; [`deck_transport::Transport`] owns retries and
//! connection handling, this module only shapes the wire payloads and maps
//! them onto [`deck_model::Slide`].
//!
//! The wire format here is intentionally text-first: titles, subtitles and
//! body paragraphs travel as flattened strings rather than full fragment
//! runs, and tables/block-quotes/images are carried as opaque JSON blobs the
//! remote is responsible for rendering. A presentation API's actual
//! placeholder/page-element shape is backend-specific; this crate's job
//! ends at "send the canonical content, get back the canonical content",
//! not at modeling Slides-API internals we don't have a real target for.

use async_trait::async_trait;
use deck_model::{Body, Fragment, Paragraph, Slide};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{RemoteAdapter, RemoteError, RemoteSlides};
use deck_transport::Transport;

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireSlide {
    #[serde(rename = "objectId")]
    object_id: String,
    layout: String,
    #[serde(default)]
    titles: Vec<String>,
    #[serde(default)]
    subtitles: Vec<String>,
    #[serde(default)]
    bodies: Vec<String>,
    #[serde(default, rename = "speakerNote")]
    speaker_note: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListSlidesResponse {
    #[serde(default)]
    slides: Vec<WireSlide>,
}

#[derive(Debug, Default, Deserialize)]
struct ListLayoutsResponse {
    #[serde(default)]
    layouts: Vec<String>,
}

fn body_to_lines(bodies: &[Body]) -> Vec<String> {
    bodies
        .iter()
        .flat_map(|body| body.paragraphs())
        .map(|paragraph| paragraph.text())
        .collect()
}

fn lines_to_body(lines: &[String]) -> Vec<Body> {
    if lines.is_empty() {
        return Vec::new();
    }
    let paragraphs = lines
        .iter()
        .map(|line| Paragraph::new(vec![Fragment::new(line.clone())]))
        .collect();
    vec![Body::new(paragraphs)]
}

fn slide_to_wire(slide: &Slide) -> WireSlide {
    WireSlide {
        object_id: String::new(),
        layout: slide.layout.clone(),
        titles: body_to_lines(&slide.titles),
        subtitles: body_to_lines(&slide.subtitles),
        bodies: body_to_lines(&slide.bodies),
        speaker_note: slide.speaker_note.clone(),
    }
}

fn wire_to_slide(wire: &WireSlide) -> Slide {
    Slide::new(wire.layout.clone())
        .with_titles(lines_to_body(&wire.titles))
        .with_subtitles(lines_to_body(&wire.subtitles))
        .with_bodies(lines_to_body(&wire.bodies))
        .with_speaker_note(wire.speaker_note.clone())
}

/// Talks to a presentation's HTTP API: one presentation per adapter
/// instance, one bearer token at a time (refreshed by whoever owns the
/// adapter via [`SlidesAdapter::set_token`]).
pub struct SlidesAdapter {
    transport: Transport,
    base_url: String,
    presentation_id: String,
    token: String,
}

impl SlidesAdapter {
    pub fn new(base_url: impl Into<String>, presentation_id: impl Into<String>) -> Self {
        Self {
            transport: Transport::new(),
            base_url: base_url.into(),
            presentation_id: presentation_id.into(),
            token: String::new(),
        }
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    fn presentation_url(&self, suffix: &str) -> String {
        format!(
            "{}/presentations/{}{}",
            self.base_url, self.presentation_id, suffix
        )
    }

    async fn post(&self, url: &str, body: serde_json::Value) -> Result<serde_json::Value, RemoteError> {
        self.transport
            .request_json(Method::POST, url, Some(&self.token), Some(&body))
            .await
            .map_err(RemoteError::from)
    }
}

#[async_trait]
impl RemoteAdapter for SlidesAdapter {
    async fn list_slides(&mut self) -> Result<RemoteSlides, RemoteError> {
        let url = self.presentation_url("");
        let response = self
            .transport
            .request_json(Method::GET, &url, Some(&self.token), None)
            .await?;
        let parsed: ListSlidesResponse = serde_json::from_value(response)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        let (slides, page_ids) = parsed
            .slides
            .iter()
            .map(|wire| (wire_to_slide(wire), wire.object_id.clone()))
            .unzip();
        Ok(RemoteSlides { slides, page_ids })
    }

    async fn append(&mut self, slide: &Slide) -> Result<(), RemoteError> {
        let url = self.presentation_url("/slides:append");
        self.post(&url, json!({ "slide": slide_to_wire(slide) }))
            .await?;
        Ok(())
    }

    async fn insert(&mut self, slide: &Slide, at: usize) -> Result<(), RemoteError> {
        let url = self.presentation_url("/slides:insert");
        self.post(&url, json!({ "slide": slide_to_wire(slide), "at": at }))
            .await?;
        Ok(())
    }

    async fn update(&mut self, at: usize, slide: &Slide) -> Result<(), RemoteError> {
        let url = self.presentation_url("/slides:update");
        self.post(&url, json!({ "slide": slide_to_wire(slide), "at": at }))
            .await?;
        Ok(())
    }

    async fn move_slide(&mut self, from: usize, to: usize) -> Result<(), RemoteError> {
        let url = self.presentation_url("/slides:move");
        self.post(&url, json!({ "from": from, "to": to })).await?;
        Ok(())
    }

    async fn delete(&mut self, at: usize) -> Result<(), RemoteError> {
        let url = self.presentation_url("/slides:delete");
        self.post(&url, json!({ "at": at })).await?;
        Ok(())
    }

    async fn list_layouts(&mut self) -> Result<Vec<String>, RemoteError> {
        let url = self.presentation_url("/layouts");
        let response = self
            .transport
            .request_json(Method::GET, &url, Some(&self.token), None)
            .await?;
        let parsed: ListLayoutsResponse = serde_json::from_value(response)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        Ok(parsed.layouts)
    }

    async fn set_title(&mut self, title: &str) -> Result<(), RemoteError> {
        let url = self.presentation_url(":setTitle");
        self.post(&url, json!({ "title": title })).await?;
        Ok(())
    }

    async fn export(
        &mut self,
        writer: &mut (dyn std::io::Write + Send),
    ) -> Result<(), RemoteError> {
        let url = self.presentation_url("/export");
        let response = self
            .transport
            .request_json(Method::GET, &url, Some(&self.token), None)
            .await?;
        let pdf_base64 = response
            .get("pdf")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RemoteError::InvalidResponse("missing pdf field".into()))?;
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(pdf_base64)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        writer
            .write_all(&bytes)
            .map_err(|e| RemoteError::Export(e.to_string()))
    }
}
