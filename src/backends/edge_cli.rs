use super::SpeechBackend;
use crate::catalog::RawVoice;
use crate::compiler::CompiledPayload;
use crate::config_loader::Settings;
use crate::error::{CatalogFetchError, SynthesisError};
use async_trait::async_trait;
use std::io::{Error, ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Drives the `edge-tts` command line tool.
///
/// The tool only takes flat prosody arguments, so styled payloads are refused.
pub struct EdgeCliBackend {
    binary_path: String,
    timeout: Duration,
}

struct ToolOutput {
    stdout: Vec<u8>,
    stderr: String,
    code: Option<i32>,
}

enum RunError {
    TimedOut,
    Io(Error),
}

impl EdgeCliBackend {
    pub fn new(binary_path: &str, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.edge_tts_binary,
            Duration::from_secs(settings.synthesis_timeout_secs),
        )
    }

    pub fn synthesis_args(payload: &CompiledPayload) -> Result<Vec<String>, SynthesisError> {
        match payload {
            CompiledPayload::Plain {
                text,
                voice_id,
                rate,
                pitch,
                volume,
            } => {
                // `=` keeps argparse from reading "-5Hz" as a flag.
                let mut args = vec![
                    format!("--voice={}", voice_id),
                    format!("--text={}", text),
                    format!("--rate={}", rate),
                    format!("--pitch={}", pitch),
                ];
                if let Some(volume) = volume {
                    args.push(format!("--volume={}", volume));
                }
                args.push("--write-media=-".to_string());
                Ok(args)
            }
            CompiledPayload::Styled { style, .. } => Err(SynthesisError::Unsupported(format!(
                "the edge-tts command line cannot send style '{}'; use the azure backend",
                style
            ))),
        }
    }

    /// Run the tool to completion, killing it after the timeout.
    /// Both pipes are drained on their own threads so a chatty child never
    /// blocks on a full pipe.
    fn run(binary: &str, args: &[String], timeout: Duration) -> Result<ToolOutput, RunError> {
        let mut child = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RunError::Io)?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunError::Io(Error::new(ErrorKind::Other, "stdout not captured")))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunError::Io(Error::new(ErrorKind::Other, "stderr not captured")))?;

        let out_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });
        let err_reader = thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        });

        let status = match child.wait_timeout(timeout).map_err(RunError::Io)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::TimedOut);
            }
        };

        let stdout = out_reader
            .join()
            .map_err(|_| RunError::Io(Error::new(ErrorKind::Other, "stdout reader panicked")))?
            .map_err(RunError::Io)?;
        let stderr = err_reader.join().unwrap_or_default();

        Ok(ToolOutput {
            stdout,
            stderr,
            code: if status.success() { None } else { Some(status.code().unwrap_or(-1)) },
        })
    }

    async fn run_blocking(&self, args: Vec<String>) -> Result<ToolOutput, RunError> {
        let binary = self.binary_path.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || Self::run(&binary, &args, timeout))
            .await
            .map_err(|e| RunError::Io(Error::new(ErrorKind::Other, e)))?
    }
}

/// Parses `edge-tts --list-voices`. Newer releases print a table
/// (`Name  Gender  ContentCategories ...`), older ones print `Key: value`
/// blocks separated by blank lines.
pub fn parse_voice_list(output: &str) -> Vec<RawVoice> {
    let mut voices = Vec::new();
    let mut block = VoiceBlock::default();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            block.flush_into(&mut voices);
            continue;
        }

        if let Some((key, value)) = line.split_once(": ") {
            let value = value.trim();
            match key {
                "ShortName" => block.id = Some(value.to_string()),
                "Name" if !value.contains(' ') => block.id = Some(value.to_string()),
                "Gender" => block.gender = Some(value.to_string()),
                "Locale" => block.locale = Some(value.to_string()),
                _ => {}
            }
            continue;
        }

        let mut cols = line.split_whitespace();
        let (Some(id), Some(gender)) = (cols.next(), cols.next()) else {
            continue;
        };
        if id == "Name" || id.starts_with('-') || id.matches('-').count() < 2 {
            continue;
        }
        voices.push(RawVoice::new(id, &locale_of(id), gender));
    }
    block.flush_into(&mut voices);

    voices
}

#[derive(Default)]
struct VoiceBlock {
    id: Option<String>,
    gender: Option<String>,
    locale: Option<String>,
}

impl VoiceBlock {
    fn flush_into(&mut self, voices: &mut Vec<RawVoice>) {
        let block = std::mem::take(self);
        if let (Some(id), Some(gender)) = (block.id, block.gender) {
            let locale = block.locale.unwrap_or_else(|| locale_of(&id));
            voices.push(RawVoice::new(&id, &locale, &gender));
        }
    }
}

fn locale_of(id: &str) -> String {
    id.splitn(3, '-').take(2).collect::<Vec<_>>().join("-")
}

fn tool_name(binary: &str) -> String {
    std::path::Path::new(binary)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(binary)
        .to_string()
}

#[async_trait]
impl SpeechBackend for EdgeCliBackend {
    fn id(&self) -> &'static str {
        "edge-cli"
    }

    async fn list_voices(&self) -> Result<Vec<RawVoice>, CatalogFetchError> {
        let output = match self.run_blocking(vec!["--list-voices".to_string()]).await {
            Ok(output) => output,
            Err(RunError::TimedOut) => {
                return Err(CatalogFetchError::Timeout(self.timeout.as_secs()))
            }
            Err(RunError::Io(e)) => return Err(CatalogFetchError::Io(e)),
        };

        if let Some(code) = output.code {
            return Err(CatalogFetchError::Process {
                tool: tool_name(&self.binary_path),
                code,
                message: output.stderr.trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let voices = parse_voice_list(&text);
        if voices.is_empty() && !text.trim().is_empty() {
            return Err(CatalogFetchError::Parse(
                "no voices recognised in edge-tts output".to_string(),
            ));
        }
        Ok(voices)
    }

    async fn synthesize(&self, payload: &CompiledPayload) -> Result<Vec<u8>, SynthesisError> {
        let args = Self::synthesis_args(payload)?;
        debug!("Running {} for voice {}", self.binary_path, payload.voice_id());

        let output = match self.run_blocking(args).await {
            Ok(output) => output,
            Err(RunError::TimedOut) => return Err(SynthesisError::Timeout(self.timeout.as_secs())),
            Err(RunError::Io(e)) => return Err(SynthesisError::Io(e)),
        };

        if let Some(code) = output.code {
            let message = output.stderr.trim().to_string();
            if message.contains("NoAudioReceived") {
                return Err(SynthesisError::Rejected {
                    voice_id: payload.voice_id().to_string(),
                    style: payload.style(),
                    detail: "no audio received".to_string(),
                });
            }
            return Err(SynthesisError::Process {
                tool: tool_name(&self.binary_path),
                code,
                message,
            });
        }

        if output.stdout.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(output.stdout)
    }
}
