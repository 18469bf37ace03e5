//! Mock stages and collaborators for tests.

use crate::context::AnalysisContext;
use crate::errors::AnalysisError;
use crate::ocr::{OcrEngine, OcrError, OcrRequest, OcrToken};
use crate::stages::Stage;
use async_trait::async_trait;
use image::GrayImage;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An OCR engine that returns canned results.
#[derive(Debug, Default)]
pub struct ScriptedOcrEngine {
    tokens: Vec<OcrToken>,
    text: String,
    error: Option<String>,
    token_calls: AtomicUsize,
    text_calls: AtomicUsize,
}

impl ScriptedOcrEngine {
    /// Creates an engine that recognizes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tokens returned by token recognition.
    #[must_use]
    pub fn with_tokens(mut self, tokens: Vec<OcrToken>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Sets the text returned by plain-text recognition.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Makes every call fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Number of token recognition calls.
    #[must_use]
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    /// Number of plain-text recognition calls.
    #[must_use]
    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), OcrError> {
        match &self.error {
            Some(message) => Err(OcrError::Engine {
                engine: self.name().to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OcrEngine for ScriptedOcrEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize_tokens(&self, _image: &GrayImage, _request: &OcrRequest) -> Result<Vec<OcrToken>, OcrError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.tokens.clone())
    }

    async fn recognize_text(&self, _image: &GrayImage, _request: &OcrRequest) -> Result<String, OcrError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.text.clone())
    }
}

/// A stage that always fails.
pub struct FailingStage {
    name: String,
    make_error: Box<dyn Fn() -> AnalysisError + Send + Sync>,
}

impl FailingStage {
    /// Fails with a generic stage error.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let stage = name.clone();
        Self {
            name,
            make_error: Box::new(move || AnalysisError::stage(stage.clone(), message.clone())),
        }
    }

    /// Fails with an IO error.
    #[must_use]
    pub fn io(name: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            name: name.into(),
            make_error: Box::new(move || std::io::Error::other(message.clone()).into()),
        }
    }
}

impl std::fmt::Debug for FailingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailingStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        Err((self.make_error)())
    }
}

/// A stage that records the subjects it saw and passes the context on.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    subjects: Mutex<Vec<String>>,
    order: Option<Arc<Mutex<Vec<String>>>>,
}

impl RecordingStage {
    /// Creates a new recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subjects: Mutex::new(Vec::new()),
            order: None,
        }
    }

    /// Also appends the stage name to a log shared with other stages.
    #[must_use]
    pub fn with_order_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.order = Some(log);
        self
    }

    /// Returns the subjects seen so far.
    #[must_use]
    pub fn subjects(&self) -> Vec<String> {
        self.subjects.lock().clone()
    }

    /// Returns the number of executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.subjects.lock().len()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        self.subjects.lock().push(ctx.subject_id().to_string());
        if let Some(order) = &self.order {
            order.lock().push(self.name.clone());
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_engine_counts_calls() {
        let engine = ScriptedOcrEngine::new().with_text("5");
        let image = GrayImage::new(2, 2);

        assert!(engine.recognize_tokens(&image, &OcrRequest::default()).await.unwrap().is_empty());
        assert_eq!(engine.recognize_text(&image, &OcrRequest::default()).await.unwrap(), "5");
        assert_eq!(engine.token_calls(), 1);
        assert_eq!(engine.text_calls(), 1);
    }

    #[test]
    fn test_failing_stage() {
        let stage = FailingStage::io("disk", "no space left");
        let err = tokio_test::block_on(stage.execute(AnalysisContext::new("s", "p.png"))).unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }

    #[test]
    fn test_recording_stage_order_log() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stage = RecordingStage::new("rec").with_order_log(Arc::clone(&log));

        tokio_test::block_on(stage.execute(AnalysisContext::new("s1", "p.png"))).unwrap();
        assert_eq!(stage.subjects(), vec!["s1".to_string()]);
        assert_eq!(*log.lock(), vec!["rec".to_string()]);
    }
}
