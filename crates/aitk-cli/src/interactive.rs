use std::io::{self, BufRead, ErrorKind, Write};

use aitk_contracts::catalog::descriptor;
use aitk_contracts::menu::{parse_menu_choice, MenuChoice, MENU_ENTRIES};
use aitk_contracts::{ToolKind, ToolRequest, ToolResult};
use aitk_engine::Toolkit;
use anyhow::Result;

/// Prints `prompt` and reads one line. `None` means end of input.
pub fn prompt_line(
    input: &mut (impl BufRead + ?Sized),
    output: &mut (impl Write + ?Sized),
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(line.trim().to_string())),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

fn input_prompt(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::WebSearch => "Enter your search query: ",
        ToolKind::ImageGeneration => "Enter image description: ",
        ToolKind::DesignFeedback => "Enter website URL: ",
    }
}

/// Collects the input a tool needs. Blank input is passed through so the tool
/// reports the validation error itself.
pub fn read_request(
    kind: ToolKind,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<Option<ToolRequest>> {
    let Some(text) = prompt_line(input, output, input_prompt(kind))? else {
        return Ok(None);
    };
    let mut request = ToolRequest::new(kind, text);
    if kind == ToolKind::ImageGeneration && !request.input.is_empty() {
        let size = prompt_line(
            input,
            output,
            "Image size (square, portrait, landscape) [square]: ",
        )?;
        if let Some(size) = size.filter(|size| !size.is_empty()) {
            request = request.with_image_size(size);
        }
    }
    Ok(Some(request))
}

pub fn print_result(output: &mut impl Write, kind: ToolKind, result: &ToolResult) -> io::Result<()> {
    let name = descriptor(kind).name;
    if !result.success {
        let message = result.error.as_deref().unwrap_or("unknown error");
        return writeln!(output, "\n❌ {name} failed: {message}");
    }

    writeln!(output, "\n✅ {name} complete")?;
    for warning in &result.warnings {
        writeln!(output, "⚠️  {warning}")?;
    }
    for path in &result.output_paths {
        writeln!(output, "Saved: {}", path.display())?;
    }
    if !result.summary.is_empty() {
        writeln!(output, "\n{}", result.summary)?;
    }
    Ok(())
}

fn print_menu(output: &mut impl Write) -> io::Result<()> {
    writeln!(output, "\nSelect a tool:\n")?;
    for entry in MENU_ENTRIES {
        writeln!(output, "{}. {}", entry.key, entry.label)?;
    }
    writeln!(output)
}

/// Menu loop until "Exit" or end of input. `open_web` runs the web interface
/// and returns when it stops; it may read from the menu's input to decide when.
pub fn run_menu(
    toolkit: &Toolkit,
    input: &mut impl BufRead,
    output: &mut impl Write,
    mut open_web: impl FnMut(&mut dyn BufRead, &mut dyn Write) -> Result<()>,
) -> Result<()> {
    writeln!(output, "AI TOOLKIT")?;
    loop {
        print_menu(output)?;
        let Some(choice) = prompt_line(input, output, "Enter choice (1-5): ")? else {
            break;
        };

        match parse_menu_choice(&choice) {
            Some(MenuChoice::Tool(kind)) => {
                let Some(request) = read_request(kind, input, output)? else {
                    break;
                };
                let result = toolkit.execute(&request);
                print_result(output, kind, &result)?;
            }
            Some(MenuChoice::WebInterface) => {
                if let Err(err) = open_web(input, output) {
                    writeln!(output, "\n❌ Web interface stopped: {err:#}")?;
                }
            }
            Some(MenuChoice::Exit) => {
                writeln!(output, "\n👋 Thanks for using AI Toolkit!")?;
                return Ok(());
            }
            None => writeln!(output, "\n❌ Invalid choice. Please try again.")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use aitk_contracts::{ImageSize, ToolKind, ToolResult};

    use super::{print_result, prompt_line, read_request, run_menu};
    use crate::test_support::fake_toolkit;

    fn run_script(script: &str, root: &std::path::Path) -> anyhow::Result<(String, usize)> {
        let (toolkit, _) = fake_toolkit(root);
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        let mut web_launches = 0;
        run_menu(&toolkit, &mut input, &mut output, |input, output| {
            web_launches += 1;
            prompt_line(input, output, "")?;
            Ok(())
        })?;
        Ok((String::from_utf8(output)?, web_launches))
    }

    #[test]
    fn prompt_line_trims_and_reports_end_of_input() -> anyhow::Result<()> {
        let mut input = Cursor::new(b"  hello world \n".to_vec());
        let mut output = Vec::new();
        assert_eq!(
            prompt_line(&mut input, &mut output, "> ")?,
            Some("hello world".to_string())
        );
        assert_eq!(prompt_line(&mut input, &mut output, "> ")?, None);
        assert_eq!(String::from_utf8(output)?, "> > ");
        Ok(())
    }

    #[test]
    fn image_request_asks_for_size() -> anyhow::Result<()> {
        let mut input = Cursor::new(b"a lighthouse\nportrait\n".to_vec());
        let mut output = Vec::new();
        let request = read_request(ToolKind::ImageGeneration, &mut input, &mut output)?;
        let request = request.ok_or_else(|| anyhow::anyhow!("expected a request"))?;
        assert_eq!(request.input, "a lighthouse");
        assert_eq!(request.options.image_size.as_deref(), Some("portrait"));
        assert_eq!(
            ImageSize::parse_lenient(request.options.image_size.as_deref()).0,
            ImageSize::Portrait
        );
        Ok(())
    }

    #[test]
    fn menu_runs_tools_and_rejects_invalid_choices() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let (output, web_launches) = run_script("9\n1\nrust ownership\n4\n\n5\n", temp.path())?;

        assert_eq!(output.matches("❌ Invalid choice. Please try again.").count(), 1);
        assert!(output.contains("✅ Web Search Agent complete"));
        assert!(output.contains("Saved: "));
        assert!(output.contains("Thanks for using AI Toolkit!"));
        assert_eq!(web_launches, 1);
        Ok(())
    }

    #[test]
    fn blank_tool_input_reports_validation_and_keeps_looping() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let (output, _) = run_script("3\n   \n5\n", temp.path())?;
        assert!(output.contains("❌ Design Feedback failed: URL cannot be empty"));
        assert!(output.contains("Thanks for using AI Toolkit!"));
        Ok(())
    }

    #[test]
    fn end_of_input_leaves_the_menu() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let (output, _) = run_script("", temp.path())?;
        assert!(output.contains("Enter choice (1-5): "));
        assert!(!output.contains("Thanks"));
        Ok(())
    }

    #[test]
    fn web_interface_returns_to_the_menu_and_failures_are_shown() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let (toolkit, _) = fake_toolkit(temp.path());
        let mut input = Cursor::new(b"4\n4\n\n5\n".to_vec());
        let mut output = Vec::new();
        let mut launches = 0;
        run_menu(&toolkit, &mut input, &mut output, |input, output| {
            launches += 1;
            if launches == 1 {
                anyhow::bail!("failed to bind 127.0.0.1:3000");
            }
            prompt_line(input, output, "")?;
            Ok(())
        })?;

        let output = String::from_utf8(output)?;
        assert_eq!(launches, 2);
        assert!(output.contains("❌ Web interface stopped: failed to bind 127.0.0.1:3000"));
        assert!(!output.contains("Invalid choice"));
        assert!(output.contains("Thanks for using AI Toolkit!"));
        Ok(())
    }

    #[test]
    fn failed_results_show_the_error() -> anyhow::Result<()> {
        let mut output = Vec::new();
        let result = ToolResult {
            success: false,
            error: Some("OpenAI error: 401 invalid key".to_string()),
            ..ToolResult::succeeded(Vec::new(), "")
        };
        print_result(&mut output, ToolKind::ImageGeneration, &result)?;
        assert_eq!(
            String::from_utf8(output)?,
            "\n❌ Image Generation failed: OpenAI error: 401 invalid key\n"
        );
        Ok(())
    }
}
