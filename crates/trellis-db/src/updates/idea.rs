//! Content idea patch builder.

use serde::Serialize;
use trellis_core::enums::IdeaStatus;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IdeaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IdeaStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<Option<serde_json::Value>>,
}

impl IdeaPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.primary_keyword.is_none()
            && self.secondary_keywords.is_none()
            && self.scoring.is_none()
    }
}

pub struct IdeaPatchBuilder(IdeaPatch);

impl IdeaPatchBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(IdeaPatch::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: IdeaStatus) -> Self {
        self.0.status = Some(status);
        self
    }

    #[must_use]
    pub fn primary_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.0.primary_keyword = Some(keyword.into());
        self
    }

    #[must_use]
    pub fn secondary_keywords(mut self, keywords: Vec<String>) -> Self {
        self.0.secondary_keywords = Some(keywords);
        self
    }

    #[must_use]
    pub fn scoring(mut self, scoring: Option<serde_json::Value>) -> Self {
        self.0.scoring = Some(scoring);
        self
    }

    #[must_use]
    pub fn build(self) -> IdeaPatch {
        self.0
    }
}

impl Default for IdeaPatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}
