use async_trait::async_trait;
use deck_model::Slide;

use crate::{RemoteAdapter, RemoteError, RemoteSlides};

/// In-memory stand-in for a real presentation backend. Exists so the apply
/// driver and the reconciliation engine's output can be exercised against a
/// live, mutable sequence in tests without a network or fake HTTP server.
pub struct MemoryAdapter {
    slides: Vec<Slide>,
    page_ids: Vec<String>,
    layouts: Vec<String>,
    title: String,
    next_id: u64,
}

impl MemoryAdapter {
    pub fn new(layouts: Vec<String>) -> Self {
        Self {
            slides: Vec::new(),
            page_ids: Vec::new(),
            layouts,
            title: String::new(),
            next_id: 0,
        }
    }

    pub fn seeded(slides: Vec<Slide>, layouts: Vec<String>) -> Self {
        let mut adapter = Self::new(layouts);
        for slide in slides {
            let id = adapter.fresh_id();
            adapter.slides.push(slide);
            adapter.page_ids.push(id);
        }
        adapter
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn fresh_id(&mut self) -> String {
        let id = format!("mem-{}", self.next_id);
        self.next_id += 1;
        id
    }
}

#[async_trait]
impl RemoteAdapter for MemoryAdapter {
    async fn list_slides(&mut self) -> Result<RemoteSlides, RemoteError> {
        Ok(RemoteSlides {
            slides: self.slides.clone(),
            page_ids: self.page_ids.clone(),
        })
    }

    async fn append(&mut self, slide: &Slide) -> Result<(), RemoteError> {
        let id = self.fresh_id();
        self.slides.push(slide.clone());
        self.page_ids.push(id);
        Ok(())
    }

    async fn insert(&mut self, slide: &Slide, at: usize) -> Result<(), RemoteError> {
        if at > self.slides.len() {
            return Err(RemoteError::NotFound { index: at });
        }
        let id = self.fresh_id();
        self.slides.insert(at, slide.clone());
        self.page_ids.insert(at, id);
        Ok(())
    }

    async fn update(&mut self, at: usize, slide: &Slide) -> Result<(), RemoteError> {
        let existing = self
            .slides
            .get_mut(at)
            .ok_or(RemoteError::NotFound { index: at })?;
        *existing = slide.clone();
        Ok(())
    }

    async fn move_slide(&mut self, from: usize, to: usize) -> Result<(), RemoteError> {
        if from >= self.slides.len() || to >= self.slides.len() {
            return Err(RemoteError::NotFound {
                index: from.max(to),
            });
        }
        let slide = self.slides.remove(from);
        self.slides.insert(to, slide);
        let id = self.page_ids.remove(from);
        self.page_ids.insert(to, id);
        Ok(())
    }

    async fn delete(&mut self, at: usize) -> Result<(), RemoteError> {
        if at >= self.slides.len() {
            return Err(RemoteError::NotFound { index: at });
        }
        self.slides.remove(at);
        self.page_ids.remove(at);
        Ok(())
    }

    async fn list_layouts(&mut self) -> Result<Vec<String>, RemoteError> {
        Ok(self.layouts.clone())
    }

    async fn set_title(&mut self, title: &str) -> Result<(), RemoteError> {
        self.title = title.to_string();
        Ok(())
    }

    async fn export(
        &mut self,
        writer: &mut (dyn std::io::Write + Send),
    ) -> Result<(), RemoteError> {
        writeln!(writer, "{} ({} slides)", self.title, self.slides.len())
            .map_err(|e| RemoteError::Export(e.to_string()))
    }
}
