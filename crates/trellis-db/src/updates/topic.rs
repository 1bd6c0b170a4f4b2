//! Research topic patch builder.

use serde::Serialize;
use trellis_core::enums::TopicStatus;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TopicPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TopicStatus>,
}

impl TopicPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

pub struct TopicPatchBuilder(TopicPatch);

impl TopicPatchBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(TopicPatch::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub fn status(mut self, status: TopicStatus) -> Self {
        self.0.status = Some(status);
        self
    }

    #[must_use]
    pub fn build(self) -> TopicPatch {
        self.0
    }
}

impl Default for TopicPatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}
