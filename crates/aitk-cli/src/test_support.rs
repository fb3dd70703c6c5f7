use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aitk_contracts::artifacts::ArtifactWriter;
use aitk_contracts::{ImageSize, NetworkFailure, ToolError};
use aitk_engine::clients::{
    GeneratedImage, ImageDownloader, ImageGenerator, PageCapturer, TextGenerator, Viewport,
    VisionAnalyzer,
};
use aitk_engine::tools::{DesignFeedbackTool, ImageGenerationTool, WebSearchTool};
use aitk_engine::Toolkit;

pub const FAKE_IMAGE_URL: &str = "https://images.example/fake.png";

/// How the fake page capturer answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBehavior {
    Succeed,
    TimeOut,
    Panic,
}

/// Stands in for every external service and counts the calls it receives.
pub struct FakeServices {
    calls: Arc<AtomicUsize>,
    capture: CaptureBehavior,
}

impl FakeServices {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl TextGenerator for FakeServices {
    fn complete(&self, _prompt: &str) -> Result<String, ToolError> {
        self.hit();
        Ok("Summary...".to_string())
    }
}

impl ImageGenerator for FakeServices {
    fn generate(&self, _prompt: &str, _size: ImageSize) -> Result<GeneratedImage, ToolError> {
        self.hit();
        Ok(GeneratedImage {
            url: FAKE_IMAGE_URL.to_string(),
            revised_prompt: None,
        })
    }
}

impl ImageDownloader for FakeServices {
    fn download(&self, _url: &str, sink: &mut dyn Write) -> Result<u64, ToolError> {
        self.hit();
        sink.write_all(b"\x89PNG").map_err(|err| ToolError::io("download", err))?;
        Ok(4)
    }
}

impl PageCapturer for FakeServices {
    fn capture(&self, url: &str, _viewport: Viewport) -> Result<Vec<u8>, ToolError> {
        self.hit();
        match self.capture {
            CaptureBehavior::Succeed => Ok(b"\x89PNG".to_vec()),
            CaptureBehavior::TimeOut => Err(ToolError::network(
                NetworkFailure::Timeout,
                format!("navigation to {url} exceeded 30s"),
            )),
            CaptureBehavior::Panic => panic!("browser crashed while loading {url}"),
        }
    }
}

impl VisionAnalyzer for FakeServices {
    fn analyze(&self, _png: &[u8], _prompt: &str) -> Result<String, ToolError> {
        self.hit();
        Ok("Clean layout.".to_string())
    }
}

pub fn fake_toolkit(root: &Path) -> (Toolkit, Arc<AtomicUsize>) {
    fake_toolkit_with(root, CaptureBehavior::Succeed)
}

pub fn fake_toolkit_with(root: &Path, capture: CaptureBehavior) -> (Toolkit, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let fake = || {
        Box::new(FakeServices {
            calls: calls.clone(),
            capture,
        })
    };
    let writer = ArtifactWriter::new(root);
    let toolkit = Toolkit::new(
        WebSearchTool::new(fake(), writer.clone()),
        ImageGenerationTool::new(fake(), fake(), writer.clone()),
        DesignFeedbackTool::new(fake(), fake(), writer),
    );
    (toolkit, calls)
}
