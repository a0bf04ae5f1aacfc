//! Code-block-to-image rendering interface. The engine that decides *when*
//! to invoke a renderer lives in this crate; the renderer itself is a
//! sub-process the caller configures (`codeBlockToImageCommand`), not an
//! image codec this crate implements.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use rhai::{Engine, Scope};

use crate::error::ProjectionError;

/// Raw image bytes, format unspecified (whatever the configured command
/// produces).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes(pub Vec<u8>);

/// Renders one fenced code block to an image. `output_hint` is a path the
/// command may write its output to instead of stdout.
pub trait CodeImageRenderer: Send + Sync {
    fn render(&self, lang: &str, content: &str, output_hint: &Path) -> Result<ImageBytes, ProjectionError>;
}

/// Spawns the configured shell command per block, feeding it `content` on
/// stdin and the three documented environment variables, and accepting
/// either a file written to `CODEBLOCK_OUTPUT` or bytes on stdout.
pub struct ShellCommandRenderer {
    command_template: String,
    engine: Engine,
}

impl ShellCommandRenderer {
    pub fn new(command_template: impl Into<String>) -> Self {
        Self {
            command_template: command_template.into(),
            engine: Engine::new(),
        }
    }
}

impl CodeImageRenderer for ShellCommandRenderer {
    fn render(&self, lang: &str, content: &str, output_hint: &Path) -> Result<ImageBytes, ProjectionError> {
        let mut scope = Scope::new();
        scope.push("CODEBLOCK_LANG", lang.to_string());
        scope.push("CODEBLOCK_CONTENT", content.to_string());
        scope.push("CODEBLOCK_OUTPUT", output_hint.display().to_string());
        let command = crate::expr::interpolate(&self.engine, &mut scope, &self.command_template)?;

        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(&command)
            .env("CODEBLOCK_LANG", lang)
            .env("CODEBLOCK_CONTENT", content)
            .env("CODEBLOCK_OUTPUT", output_hint)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProjectionError::CodeImage(e.to_string()))?;

        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(content.as_bytes())
            .map_err(|e| ProjectionError::CodeImage(e.to_string()))?;

        let output = child
            .wait_with_output()
            .map_err(|e| ProjectionError::CodeImage(e.to_string()))?;
        if !output.status.success() {
            return Err(ProjectionError::CodeImage(format!(
                "command exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        if let Ok(bytes) = std::fs::read(output_hint) {
            if !bytes.is_empty() {
                let _ = std::fs::remove_file(output_hint);
                return Ok(ImageBytes(bytes));
            }
        }
        if !output.stdout.is_empty() {
            return Ok(ImageBytes(output.stdout));
        }
        Err(ProjectionError::CodeImage(
            "command produced no image on stdout or CODEBLOCK_OUTPUT".to_string(),
        ))
    }
}

/// One fenced block awaiting rendering, keyed by its position in the
/// document so results can be put back in order regardless of completion
/// order.
pub struct CodeBlockJob {
    pub index: usize,
    pub lang: String,
    pub content: String,
}

fn output_hint_path(index: usize) -> PathBuf {
    std::env::temp_dir().join(format!("deck-codeblock-{}-{}.img", std::process::id(), index))
}

/// Renders every block in `jobs` in parallel, one OS thread per block. The
/// first failure flips a shared cancellation flag so threads that haven't
/// started their subprocess yet skip it; in-flight subprocess calls still
/// run to completion (killing them needs platform-specific signal handling,
/// out of scope here). Results come back sorted by `index`, not completion
/// order.
pub fn render_all(
    jobs: &[CodeBlockJob],
    renderer: &dyn CodeImageRenderer,
) -> Result<Vec<(usize, ImageBytes)>, ProjectionError> {
    let cancelled = AtomicBool::new(false);
    let (tx, rx) = crossbeam_channel::unbounded();

    std::thread::scope(|scope| {
        for job in jobs {
            let tx = tx.clone();
            let cancelled = &cancelled;
            scope.spawn(move || {
                if cancelled.load(Ordering::Relaxed) {
                    return;
                }
                let output_hint = output_hint_path(job.index);
                let result = renderer.render(&job.lang, &job.content, &output_hint);
                if result.is_err() {
                    cancelled.store(true, Ordering::Relaxed);
                }
                let _ = tx.send((job.index, result));
            });
        }
        drop(tx);
    });

    let mut results = Vec::new();
    let mut first_err = None;
    for (index, result) in rx.iter() {
        match result {
            Ok(bytes) => results.push((index, bytes)),
            Err(e) if first_err.is_none() => first_err = Some(e),
            Err(_) => {}
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }
    results.sort_by_key(|(index, _)| *index);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRenderer(Vec<u8>);

    impl CodeImageRenderer for FixedRenderer {
        fn render(&self, _lang: &str, _content: &str, _output_hint: &Path) -> Result<ImageBytes, ProjectionError> {
            Ok(ImageBytes(self.0.clone()))
        }
    }

    struct FailingRenderer;

    impl CodeImageRenderer for FailingRenderer {
        fn render(&self, _lang: &str, _content: &str, _output_hint: &Path) -> Result<ImageBytes, ProjectionError> {
            Err(ProjectionError::CodeImage("boom".to_string()))
        }
    }

    #[test]
    fn shell_renderer_captures_stdout() {
        let renderer = ShellCommandRenderer::new("cat");
        let result = renderer.render("rust", "hello", Path::new("/tmp/deck-codeimage-test-unused"));
        assert_eq!(result.unwrap().0, b"hello");
    }

    #[test]
    fn shell_renderer_interpolates_the_lang_binding() {
        let renderer = ShellCommandRenderer::new("echo -n {{CODEBLOCK_LANG}}");
        let result = renderer.render("python", "ignored", Path::new("/tmp/deck-codeimage-test-unused"));
        assert_eq!(result.unwrap().0, b"python");
    }

    #[test]
    fn shell_renderer_surfaces_nonzero_exit() {
        let renderer = ShellCommandRenderer::new("exit 1");
        let result = renderer.render("rust", "x", Path::new("/tmp/deck-codeimage-test-unused"));
        assert!(result.is_err());
    }

    #[test]
    fn render_all_preserves_index_order_regardless_of_completion() {
        let jobs = vec![
            CodeBlockJob { index: 0, lang: "rust".into(), content: "a".into() },
            CodeBlockJob { index: 1, lang: "rust".into(), content: "b".into() },
            CodeBlockJob { index: 2, lang: "rust".into(), content: "c".into() },
        ];
        let renderer = FixedRenderer(b"img".to_vec());
        let results = render_all(&jobs, &renderer).unwrap();
        let indices: Vec<_> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn render_all_surfaces_the_first_failure() {
        let jobs = vec![CodeBlockJob { index: 0, lang: "rust".into(), content: "a".into() }];
        let renderer = FailingRenderer;
        let results = render_all(&jobs, &renderer);
        assert!(results.is_err());
    }
}
