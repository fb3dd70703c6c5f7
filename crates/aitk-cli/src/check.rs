use std::io::{self, Write};
use std::path::{Path, PathBuf};

use aitk_contracts::artifacts::{ArtifactCategory, ArtifactWriter};
use aitk_contracts::config::{
    Credentials, SecretsFile, ToolkitSettings, GEMINI_API_KEY, OPENAI_API_KEY,
};
use aitk_engine::clients::ChromeCapture;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Check {
    label: String,
    passed: bool,
}

impl Check {
    fn new(label: impl Into<String>, passed: bool) -> Self {
        Self {
            label: label.into(),
            passed,
        }
    }
}

#[derive(Debug)]
struct ConfigReport {
    sections: Vec<(&'static str, Vec<Check>)>,
}

impl ConfigReport {
    fn collect(
        secrets: &Path,
        secrets_status: &SecretsFile,
        settings: &ToolkitSettings,
        credentials: &Credentials,
        browser: Option<PathBuf>,
    ) -> Self {
        let files = vec![
            match secrets_status {
                SecretsFile::Loaded => Check::new(secrets.display().to_string(), true),
                SecretsFile::Missing => Check::new(secrets.display().to_string(), false),
                SecretsFile::Invalid(reason) => {
                    Check::new(format!("{} ({reason})", secrets.display()), false)
                }
            },
            Check::new(
                format!("{} (web interface)", settings.public_dir.display()),
                settings.public_dir.join("index.html").is_file(),
            ),
        ];

        let writer = ArtifactWriter::new(&settings.output_dir);
        let directories = ArtifactCategory::ALL
            .into_iter()
            .map(|category| {
                Check::new(
                    format!("{}/", category.relative_dir()),
                    writer.category_dir(category).is_dir(),
                )
            })
            .collect();

        let keys = vec![
            Check::new(OPENAI_API_KEY, credentials.has_openai()),
            Check::new(GEMINI_API_KEY, credentials.has_gemini()),
        ];

        let browser = vec![match browser {
            Some(path) => Check::new(format!("headless browser: {}", path.display()), true),
            None => Check::new("headless browser (Chrome or Chromium)", false),
        }];

        Self {
            sections: vec![
                ("Files", files),
                ("Directories", directories),
                ("API Keys", keys),
                ("Browser", browser),
            ],
        }
    }

    fn all_passed(&self) -> bool {
        self.sections
            .iter()
            .flat_map(|(_, checks)| checks)
            .all(|check| check.passed)
    }

    fn render(&self, output: &mut impl Write) -> io::Result<()> {
        writeln!(output, "CONFIGURATION CHECK")?;
        for (title, checks) in &self.sections {
            writeln!(output, "\n{title}:")?;
            for check in checks {
                let mark = if check.passed { "✅" } else { "❌" };
                writeln!(output, "{mark} {}", check.label)?;
            }
        }
        writeln!(output, "\n{}", "═".repeat(50))?;

        if self.all_passed() {
            writeln!(output, "\n✅ All checks passed! Ready to use AI Toolkit\n")?;
            writeln!(output, "Get started:")?;
            writeln!(output, "  aitk                  - Interactive menu")?;
            writeln!(output, "  aitk search <query>   - Web search agent")?;
            writeln!(output, "  aitk image <prompt>   - Image generation")?;
            writeln!(output, "  aitk feedback <url>   - Design feedback")?;
            writeln!(output, "  aitk serve            - Web interface")?;
        } else {
            writeln!(output, "\n❌ Some checks failed. Please review above.\n")?;
            writeln!(output, "Fix:")?;
            writeln!(
                output,
                "  Add {OPENAI_API_KEY}=... and {GEMINI_API_KEY}=... to the secrets file"
            )?;
            writeln!(
                output,
                "  mkdir -p references/ai_feedback images screenshots (or run any tool once)"
            )?;
            writeln!(
                output,
                "  Install Chrome or Chromium, or point AITK_CHROME at the executable"
            )?;
        }
        Ok(())
    }
}

pub fn run(
    secrets: &Path,
    secrets_status: &SecretsFile,
    settings: &ToolkitSettings,
    credentials: &Credentials,
) -> Result<i32> {
    let browser = ChromeCapture::new(settings.chrome_path.clone(), settings.navigation_timeout)
        .locate_executable();
    let report = ConfigReport::collect(secrets, secrets_status, settings, credentials, browser);
    report.render(&mut io::stdout())?;
    Ok(if report.all_passed() { 0 } else { 1 })
}
