use aitk_contracts::artifacts::{ArtifactCategory, ArtifactName, ArtifactWriter};
use aitk_contracts::tools::require_input;
use aitk_contracts::{ImageSize, ToolError, ToolResult};
use tracing::{debug, warn};

use crate::clients::{ImageDownloader, ImageGenerator};

pub struct ImageGenerationTool {
    images: Box<dyn ImageGenerator>,
    downloader: Box<dyn ImageDownloader>,
    writer: ArtifactWriter,
}

impl ImageGenerationTool {
    pub fn new(
        images: Box<dyn ImageGenerator>,
        downloader: Box<dyn ImageDownloader>,
        writer: ArtifactWriter,
    ) -> Self {
        Self {
            images,
            downloader,
            writer,
        }
    }

    pub fn run(&self, prompt: &str, size: Option<&str>) -> Result<ToolResult, ToolError> {
        let prompt = require_input(prompt, "Prompt")?;
        let (size, size_warning) = ImageSize::parse_lenient(size);
        if let Some(message) = &size_warning {
            warn!("{message}");
        }

        debug!(size = size.dimensions(), "generating image");
        let generated = self.images.generate(prompt, size)?;
        let name = ArtifactName::new("image", "png");
        let path = self
            .writer
            .write_with(ArtifactCategory::Images, &name, |sink| {
                self.downloader.download(&generated.url, sink).map(|_| ())
            })?;

        let mut result = ToolResult::succeeded(
            vec![path.clone()],
            format!(
                "Generated {} image saved to: {}\nImage URL: {}",
                size.dimensions(),
                path.display(),
                generated.url
            ),
        );
        result.warnings.extend(size_warning);
        result.source_url = Some(generated.url);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use aitk_contracts::artifacts::ArtifactWriter;
    use aitk_contracts::{ImageSize, NetworkFailure, ToolError};

    use super::ImageGenerationTool;
    use crate::clients::{GeneratedImage, ImageDownloader, ImageGenerator};

    const FIXED_URL: &str = "https://images.example/generated/abc.png";
    const FIXED_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 1, 2, 255];

    #[derive(Default)]
    struct FakeImages {
        calls: Arc<AtomicUsize>,
        sizes: Arc<Mutex<Vec<ImageSize>>>,
    }

    impl ImageGenerator for FakeImages {
        fn generate(&self, _prompt: &str, size: ImageSize) -> Result<GeneratedImage, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut sizes) = self.sizes.lock() {
                sizes.push(size);
            }
            Ok(GeneratedImage {
                url: FIXED_URL.to_string(),
                revised_prompt: None,
            })
        }
    }

    #[derive(Default)]
    struct FakeDownloader {
        urls: Arc<Mutex<Vec<String>>>,
    }

    impl ImageDownloader for FakeDownloader {
        fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ToolError> {
            if let Ok(mut urls) = self.urls.lock() {
                urls.push(url.to_string());
            }
            sink.write_all(FIXED_BYTES)
                .map_err(|err| ToolError::io("sink", err))?;
            Ok(FIXED_BYTES.len() as u64)
        }
    }

    struct BrokenDownloader;

    impl ImageDownloader for BrokenDownloader {
        fn download(&self, _url: &str, sink: &mut dyn Write) -> Result<u64, ToolError> {
            sink.write_all(&FIXED_BYTES[..4])
                .map_err(|err| ToolError::io("sink", err))?;
            Err(ToolError::network(
                NetworkFailure::Connection,
                "connection reset by peer",
            ))
        }
    }

    struct RejectingImages;

    impl ImageGenerator for RejectingImages {
        fn generate(&self, _prompt: &str, _size: ImageSize) -> Result<GeneratedImage, ToolError> {
            Err(ToolError::api("OpenAI", "400 Your request was rejected by the safety system"))
        }
    }

    #[test]
    fn downloaded_bytes_are_written_exactly() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let urls = Arc::new(Mutex::new(Vec::new()));
        let tool = ImageGenerationTool::new(
            Box::new(FakeImages::default()),
            Box::new(FakeDownloader { urls: urls.clone() }),
            ArtifactWriter::new(temp.path()),
        );

        let result = tool.run("A modern hero section with purple accents", None)?;

        assert!(result.success);
        assert_eq!(result.source_url.as_deref(), Some(FIXED_URL));
        assert_eq!(fs::read(&result.output_paths[0])?, FIXED_BYTES);
        let file_name = result.output_paths[0]
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        assert!(file_name.starts_with("image_"));
        assert!(file_name.ends_with(".png"));
        assert_eq!(urls.lock().map(|u| u.clone()).unwrap_or_default(), vec![FIXED_URL]);
        assert!(result.summary.contains(FIXED_URL));
        Ok(())
    }

    #[test]
    fn unknown_size_falls_back_to_square_with_warning() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let tool = ImageGenerationTool::new(
            Box::new(FakeImages {
                sizes: sizes.clone(),
                ..FakeImages::default()
            }),
            Box::new(FakeDownloader::default()),
            ArtifactWriter::new(temp.path()),
        );

        let result = tool.run("boat", Some("enormous"))?;
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);

        let result = tool.run("boat", Some("landscape"))?;
        assert!(result.warnings.is_empty());

        assert_eq!(
            sizes.lock().map(|s| s.clone()).unwrap_or_default(),
            vec![ImageSize::Square, ImageSize::Landscape]
        );
        Ok(())
    }

    #[test]
    fn blank_prompt_never_reaches_the_api() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let calls = Arc::new(AtomicUsize::new(0));
        let tool = ImageGenerationTool::new(
            Box::new(FakeImages {
                calls: calls.clone(),
                ..FakeImages::default()
            }),
            Box::new(FakeDownloader::default()),
            ArtifactWriter::new(temp.path()),
        );

        let err = tool.run("  \n", Some("portrait")).err();
        assert!(err.map(|err| err.is_validation()).unwrap_or(false));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn failed_download_leaves_no_listable_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let tool = ImageGenerationTool::new(
            Box::new(FakeImages::default()),
            Box::new(BrokenDownloader),
            ArtifactWriter::new(temp.path()),
        );

        let err = tool.run("boat", None).err();
        assert_eq!(err.map(|err| err.category()), Some("network"));
        let images = temp.path().join("images");
        let leftovers = fs::read_dir(&images)?.count();
        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[test]
    fn generation_error_is_terminal() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let tool = ImageGenerationTool::new(
            Box::new(RejectingImages),
            Box::new(FakeDownloader::default()),
            ArtifactWriter::new(temp.path()),
        );
        let err = tool.run("boat", None).err();
        assert_eq!(err.map(|err| err.category()), Some("api"));
        assert!(!temp.path().join("images").exists());
        Ok(())
    }
}
