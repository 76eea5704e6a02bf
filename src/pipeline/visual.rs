//! Visual enrichment: a prompt-writing call, then an image call, per record.
//!
//! Records are enriched independently; a failure at either step leaves that one
//! record without an image and touches nothing else.

use crate::agent::{GenerationRequest, TargetShape, Tuning};
use crate::pipeline::Pipeline;
use crate::provider::{ImageRequest, ImageSize};
use crate::records::{Concept, OpportunitySpace, PersonaCard};
use crate::task::{SingleAgentTask, TaskOutcome};
use tracing::{debug, warn};

/// What an image should depict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualSubject {
    pub title: String,
    pub text: String,
    pub keyword: String,
}

impl VisualSubject {
    fn to_context(&self) -> String {
        format!("Title: {}\n\n{}", self.title, self.text)
    }
}

/// A record that can carry an image
pub trait Visual {
    fn visual_subject(&self) -> VisualSubject;

    fn image_url(&self) -> Option<&str>;

    fn set_image_url(&mut self, url: Option<String>);
}

impl Visual for Concept {
    fn visual_subject(&self) -> VisualSubject {
        VisualSubject {
            title: self.title.clone(),
            text: format!("{}\n\n{}", self.summary, self.description),
            keyword: self.keyword.clone(),
        }
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }
}

impl Visual for OpportunitySpace {
    fn visual_subject(&self) -> VisualSubject {
        VisualSubject {
            title: self.title.clone(),
            text: format!("{}\n\nThemes: {}", self.summary, self.themes.join(", ")),
            keyword: self.keyword.clone(),
        }
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }
}

impl Visual for PersonaCard {
    fn visual_subject(&self) -> VisualSubject {
        VisualSubject {
            title: self.name.clone(),
            text: self.portrait_brief(),
            keyword: self.keyword.clone(),
        }
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }
}

impl<T: Visual> Visual for TaskOutcome<T> {
    fn visual_subject(&self) -> VisualSubject {
        self.value.visual_subject()
    }

    fn image_url(&self) -> Option<&str> {
        self.value.image_url()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.value.set_image_url(url);
    }
}

impl Pipeline {
    /// Step 1: one image prompt for `subject`, or `None` if the agent gave nothing usable.
    pub async fn write_image_prompt(&self, subject: &VisualSubject) -> Option<String> {
        let request = GenerationRequest::new(
            self.prompts().image_prompt.clone(),
            subject.to_context(),
            TargetShape::ImagePrompt,
            Tuning::BRIEF,
        );
        SingleAgentTask::new(self.client(), request)
            .run_text()
            .await
            .into_value()
    }

    /// Step 2: the first image location generated for `prompt`.
    pub async fn render_image(&self, prompt: &str, size: ImageSize) -> Option<String> {
        let response = self
            .client()
            .generate_image(&ImageRequest::single(prompt, size))
            .await;
        match response.into_images() {
            Ok(locations) => locations.into_iter().next(),
            Err(reason) => {
                warn!(fault = reason.fault().as_str(), reason = %reason, "No image generated");
                None
            }
        }
    }

    /// Both steps for one subject.
    pub async fn visualize(&self, subject: &VisualSubject, size: ImageSize) -> Option<String> {
        let Some(prompt) = self.write_image_prompt(subject).await else {
            debug!(title = %subject.title, "No image prompt; skipping image");
            return None;
        };
        self.render_image(&prompt, size).await
    }

    /// Enrich every record concurrently. Records whose image failed get `None`.
    pub async fn enrich<T: Visual>(&self, records: &mut [T], size: ImageSize) {
        let subjects: Vec<VisualSubject> = records.iter().map(Visual::visual_subject).collect();
        let tasks = subjects
            .iter()
            .map(|subject| self.visualize(subject, size))
            .collect();
        let images = self.executor().run("visual_enrichment", tasks).await;
        for (record, image) in records.iter_mut().zip(images) {
            record.set_image_url(image);
        }
    }

    /// Generated image if present, else the deterministic keyword image.
    pub fn display_image<T: Visual>(&self, record: &T) -> String {
        match record.image_url() {
            Some(url) => url.to_string(),
            None => {
                let subject = record.visual_subject();
                let keyword = self.defaults().keyword_for(Some(&subject.keyword), &subject.title);
                self.defaults().fallback_image_url(&keyword)
            }
        }
    }
}
