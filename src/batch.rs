//! Sequential batch conversion: one output file per job.
//!
//! Each job's text is resolved, normalized and chunked; chunks are sent to
//! the API one at a time, in order, and their audio is joined into a single
//! file. A failing job is recorded and the batch moves on.
//!
//! If any chunk of a job fails, the audio already produced for that job is
//! discarded and no output file is written for it. Output files are written
//! through a `.part` sibling and renamed into place.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use derive_builder::Builder;

use crate::audio;
use crate::credentials::mask;
use crate::error::{BatchError, SpeechError};
use crate::text::{self, DEFAULT_MAX_CHUNK_CHARS};
use crate::{CancelToken, SpeechApi, SynthesisParams};

/// Where a job's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    File(PathBuf),
    /// Pasted text; `name` becomes the output file stem.
    Text { name: String, text: String },
}

/// One text source mapped to one output audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source: JobSource,
    /// Explicit output path. Derived from the source and output directory
    /// when `None`.
    pub output: Option<PathBuf>,
}

impl ConversionJob {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: JobSource::File(path.into()),
            output: None,
        }
    }

    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: JobSource::Text {
                name: name.into(),
                text: text.into(),
            },
            output: None,
        }
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Short name used in progress output and error messages.
    pub fn label(&self) -> String {
        match &self.source {
            JobSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            JobSource::Text { name, .. } => name.clone(),
        }
    }

    fn stem(&self) -> String {
        match &self.source {
            JobSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string()),
            JobSource::Text { name, .. } => sanitize_stem(name),
        }
    }

    fn resolve_text(&self) -> Result<String, SpeechError> {
        match &self.source {
            JobSource::File(path) => text::read_text_file(path),
            JobSource::Text { text, .. } => Ok(text.clone()),
        }
    }
}

fn sanitize_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "text".to_string()
    } else {
        cleaned
    }
}

/// Settings shared by every job of a batch.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct BatchOptions {
    #[builder(default)]
    pub params: SynthesisParams,
    /// Maximum characters per synthesis request.
    #[builder(default = "DEFAULT_MAX_CHUNK_CHARS")]
    pub max_chunk_chars: usize,
    /// Directory for derived output paths. Created if missing.
    pub output_dir: PathBuf,
    #[builder(default = "true")]
    pub normalize_whitespace: bool,
    /// Jobs whose text is longer than this fail with `TextTooLarge`.
    #[builder(default)]
    pub max_job_chars: Option<usize>,
}

/// Final state of one job.
#[derive(Debug)]
pub enum JobOutcome {
    Completed {
        output: PathBuf,
        bytes: usize,
        chunks: usize,
    },
    Failed {
        error: SpeechError,
        /// Zero-based index of the failing chunk and the job's chunk count.
        chunk: Option<(usize, usize)>,
    },
    Cancelled,
}

#[derive(Debug)]
pub struct JobResult {
    /// Position of the job in the submitted list.
    pub index: usize,
    pub label: String,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, JobOutcome::Completed { .. })
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {} ({})", self.index + 1, self.label)?;
        match &self.outcome {
            JobOutcome::Completed {
                output,
                bytes,
                chunks,
            } => write!(
                f,
                ": wrote {} ({bytes} bytes, {chunks} chunk{})",
                output.display(),
                if *chunks == 1 { "" } else { "s" }
            ),
            JobOutcome::Failed {
                error,
                chunk: Some((i, n)),
            } => write!(f, ", chunk {}/{n}: {error} [{}]", i + 1, error.kind()),
            JobOutcome::Failed { error, chunk: None } => {
                write!(f, ": {error} [{}]", error.kind())
            }
            JobOutcome::Cancelled => f.write_str(": cancelled"),
        }
    }
}

/// Per-job results in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<JobResult>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Completed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Cancelled))
    }

    fn count(&self, pred: impl Fn(&JobOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Progress hooks. All methods default to doing nothing.
pub trait BatchObserver {
    fn job_started(&mut self, _index: usize, _job: &ConversionJob, _chunks: usize) {}
    fn chunk_synthesized(&mut self, _index: usize, _chunk: usize, _chunks: usize) {}
    fn job_finished(&mut self, _result: &JobResult) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Convert every job in order with `api_key`.
///
/// Returns `Err` only for problems that affect the whole run: a missing key,
/// invalid shared parameters or an unusable output directory. Everything
/// else is recorded in the job's result.
pub fn run_batch<A: SpeechApi + ?Sized>(
    api: &A,
    api_key: &str,
    jobs: &[ConversionJob],
    options: &BatchOptions,
    cancel: &CancelToken,
    observer: &mut dyn BatchObserver,
) -> Result<BatchReport, BatchError> {
    if api_key.trim().is_empty() {
        return Err(BatchError::NoApiKeys);
    }
    if options.max_chunk_chars == 0 {
        return Err(BatchError::InvalidParameter(
            "chunk size must be positive".to_string(),
        ));
    }
    options.params.validate().map_err(BatchError::InvalidParameter)?;
    prepare_output_dir(&options.output_dir)?;

    log::info!(
        "Converting {} job(s) with voice {} / model {} / {} using key {}",
        jobs.len(),
        options.params.voice_id,
        options.params.model_id,
        options.params.output_format,
        mask(api_key)
    );

    let mut claimed = HashSet::new();
    let mut report = BatchReport::default();

    for (index, job) in jobs.iter().enumerate() {
        let outcome = if cancel.is_cancelled() {
            JobOutcome::Cancelled
        } else {
            let output = output_path(job, options, &mut claimed);
            convert_job(api, api_key, index, job, &output, options, cancel, observer)
        };

        let result = JobResult {
            index,
            label: job.label(),
            outcome,
        };
        match &result.outcome {
            JobOutcome::Completed { .. } => log::info!("{result}"),
            JobOutcome::Failed { .. } => log::warn!("{result}"),
            JobOutcome::Cancelled => log::debug!("{result}"),
        }
        observer.job_finished(&result);
        report.results.push(result);
    }

    log::info!(
        "Batch finished: {} completed, {} failed, {} cancelled",
        report.completed(),
        report.failed(),
        report.cancelled()
    );
    Ok(report)
}

fn prepare_output_dir(dir: &Path) -> Result<(), BatchError> {
    let err = |source| BatchError::OutputDir {
        path: dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(err)?;
    if !fs::metadata(dir).map_err(err)?.is_dir() {
        return Err(err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "not a directory",
        )));
    }

    // Mode bits alone miss ownership and ACL denials; create a real file.
    tempfile::Builder::new()
        .prefix(".tts-batch-")
        .tempfile_in(dir)
        .map_err(err)?;
    Ok(())
}

/// Explicit path, or `<output_dir>/<stem>.<ext>` with a numeric suffix when
/// an earlier job of the batch already claimed that name.
fn output_path(
    job: &ConversionJob,
    options: &BatchOptions,
    claimed: &mut HashSet<PathBuf>,
) -> PathBuf {
    if let Some(path) = &job.output {
        claimed.insert(path.clone());
        return path.clone();
    }

    let ext = options.params.output_format.extension();
    let stem = job.stem();
    let mut candidate = options.output_dir.join(format!("{stem}.{ext}"));
    let mut n = 2;
    while claimed.contains(&candidate) {
        candidate = options.output_dir.join(format!("{stem}_{n}.{ext}"));
        n += 1;
    }
    claimed.insert(candidate.clone());
    candidate
}

#[allow(clippy::too_many_arguments)]
fn convert_job<A: SpeechApi + ?Sized>(
    api: &A,
    api_key: &str,
    index: usize,
    job: &ConversionJob,
    output: &Path,
    options: &BatchOptions,
    cancel: &CancelToken,
    observer: &mut dyn BatchObserver,
) -> JobOutcome {
    let failed = |error| JobOutcome::Failed { error, chunk: None };

    let raw = match job.resolve_text() {
        Ok(raw) => raw,
        Err(error) => return failed(error),
    };
    let text = if options.normalize_whitespace {
        text::normalize(&raw)
    } else {
        raw
    };

    if text.trim().is_empty() {
        return failed(SpeechError::EmptyText);
    }
    let chars = text.chars().count();
    if let Some(limit) = options.max_job_chars {
        if chars > limit {
            return failed(SpeechError::TextTooLarge { chars, limit });
        }
    }

    let pieces = match text::split_into_chunks(&text, options.max_chunk_chars) {
        Ok(pieces) => pieces,
        Err(error) => return failed(error),
    };
    let chunks: Vec<&str> = pieces
        .iter()
        .map(|c| c.speakable())
        .filter(|s| !s.is_empty())
        .collect();
    let total = chunks.len();
    log::debug!(
        "{}: {chars} characters in {total} chunk(s)",
        job.label()
    );
    observer.job_started(index, job, total);

    let mut segments = Vec::with_capacity(total);
    for (i, chunk) in chunks.iter().enumerate() {
        if cancel.is_cancelled() {
            log::debug!("{}: cancelled before chunk {}/{total}", job.label(), i + 1);
            return JobOutcome::Cancelled;
        }
        match api.synthesize(api_key, chunk, &options.params) {
            Ok(audio) => {
                segments.push(audio);
                observer.chunk_synthesized(index, i, total);
            }
            Err(error) => {
                return JobOutcome::Failed {
                    error,
                    chunk: Some((i, total)),
                }
            }
        }
    }

    let bytes = match audio::assemble(options.params.output_format, &segments) {
        Ok(bytes) => bytes,
        Err(error) => return failed(error),
    };
    if let Err(error) = audio::write_atomic(output, &bytes) {
        return failed(error);
    }

    JobOutcome::Completed {
        output: output.to_path_buf(),
        bytes: bytes.len(),
        chunks: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedApi;
    use crate::{ErrorKind, OutputFormat};

    fn options(dir: &Path) -> BatchOptions {
        BatchOptionsBuilder::default()
            .output_dir(dir.to_path_buf())
            .build()
            .unwrap()
    }

    fn run(api: &ScriptedApi, jobs: &[ConversionJob], opts: &BatchOptions) -> BatchReport {
        run_batch(api, "sk_test", jobs, opts, &CancelToken::new(), &mut NoopObserver).unwrap()
    }

    #[test]
    fn builder_defaults() {
        let opts = options(Path::new("out"));
        assert_eq!(opts.max_chunk_chars, DEFAULT_MAX_CHUNK_CHARS);
        assert!(opts.normalize_whitespace);
        assert!(opts.max_job_chars.is_none());
        assert!(BatchOptionsBuilder::default().build().is_err());
    }

    #[test]
    fn auth_failure_on_second_job_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new()
            .then_audio(b"job-one")
            .then_error(SpeechError::Authentication("invalid_api_key".into()))
            .then_audio(b"job-three");
        let jobs = vec![
            ConversionJob::text("first", "Hello there."),
            ConversionJob::text("second", "General Kenobi."),
            ConversionJob::text("third", "You are a bold one."),
        ];

        let report = run(&api, &jobs, &options(dir.path()));
        assert_eq!(report.len(), 3);

        match &report.results[0].outcome {
            JobOutcome::Completed { output, bytes, chunks } => {
                assert_eq!(output, &dir.path().join("first.mp3"));
                assert_eq!(*bytes, 7);
                assert_eq!(*chunks, 1);
                assert_eq!(fs::read(output).unwrap(), b"job-one");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        match &report.results[1].outcome {
            JobOutcome::Failed { error, chunk } => {
                assert_eq!(error.kind(), ErrorKind::Authentication);
                assert_eq!(*chunk, Some((0, 1)));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(report.results[2].is_completed());
        assert!(!dir.path().join("second.mp3").exists());
        assert_eq!(api.synth_calls.borrow().len(), 3);
    }

    #[test]
    fn long_text_is_split_and_joined_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new()
            .then_audio(b"A")
            .then_audio(b"B")
            .then_audio(b"C");
        let opts = BatchOptionsBuilder::default()
            .output_dir(dir.path().to_path_buf())
            .max_chunk_chars(12usize)
            .build()
            .unwrap();
        let jobs = vec![ConversionJob::text("story", "One two. Three four. Five six.")];

        let report = run(&api, &jobs, &opts);
        assert_eq!(report.completed(), 1);
        assert_eq!(fs::read(dir.path().join("story.mp3")).unwrap(), b"ABC");
        assert_eq!(
            *api.synth_calls.borrow(),
            vec!["One two.", "Three four.", "Five six."]
        );
    }

    #[test]
    fn mid_job_failure_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new()
            .then_audio(b"A")
            .then_error(SpeechError::RateLimited("too_many_concurrent_requests".into()));
        let opts = BatchOptionsBuilder::default()
            .output_dir(dir.path().to_path_buf())
            .max_chunk_chars(12usize)
            .build()
            .unwrap();
        let jobs = vec![ConversionJob::text("story", "One two. Three four. Five six.")];

        let report = run(&api, &jobs, &opts);
        let result = &report.results[0];
        match &result.outcome {
            JobOutcome::Failed { error, chunk } => {
                assert_eq!(error.kind(), ErrorKind::RateLimit);
                assert_eq!(*chunk, Some((1, 3)));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(result.to_string().starts_with("job 1 (story), chunk 2/3: rate limited"));
        assert_eq!(api.synth_calls.borrow().len(), 2);
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn reads_files_and_reports_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("chapter.txt");
        fs::write(&input, "Chapter\t\tone.").unwrap();
        let out = dir.path().join("out");

        let api = ScriptedApi::new();
        let jobs = vec![
            ConversionJob::file(dir.path().join("missing.txt")),
            ConversionJob::file(&input),
        ];
        let report = run(&api, &jobs, &options(&out));

        match &report.results[0].outcome {
            JobOutcome::Failed { error, chunk: None } => {
                assert_eq!(error.kind(), ErrorKind::FileAccess)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(report.results[0].label, "missing.txt");
        assert!(report.results[1].is_completed());
        // The scripted API echoes the normalized text back as audio.
        assert_eq!(fs::read(out.join("chapter.mp3")).unwrap(), b"Chapter one.");
    }

    #[test]
    fn empty_and_oversized_texts_fail_without_calls() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new();
        let opts = BatchOptionsBuilder::default()
            .output_dir(dir.path().to_path_buf())
            .max_job_chars(Some(5usize))
            .build()
            .unwrap();
        let jobs = vec![
            ConversionJob::text("blank", " \n\t "),
            ConversionJob::text("long", "far too long"),
        ];

        let report = run(&api, &jobs, &opts);
        assert!(matches!(
            report.results[0].outcome,
            JobOutcome::Failed { error: SpeechError::EmptyText, .. }
        ));
        assert!(matches!(
            report.results[1].outcome,
            JobOutcome::Failed {
                error: SpeechError::TextTooLarge { chars: 12, limit: 5 },
                ..
            }
        ));
        assert!(api.synth_calls.borrow().is_empty());
    }

    #[test]
    fn cancel_stops_before_the_next_call() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancelToken::new();
        let mut api = ScriptedApi::new();
        api.cancel_after = Some((1, token.clone()));
        let opts = BatchOptionsBuilder::default()
            .output_dir(dir.path().to_path_buf())
            .max_chunk_chars(12usize)
            .build()
            .unwrap();
        let jobs = vec![
            ConversionJob::text("a", "One two. Three four."),
            ConversionJob::text("b", "Five six."),
        ];

        let report = run_batch(&api, "sk_test", &jobs, &opts, &token, &mut NoopObserver).unwrap();
        assert_eq!(report.cancelled(), 2);
        assert_eq!(api.synth_calls.borrow().len(), 1);
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    /// Cancels from another thread once the first job is done, the way an
    /// interrupt handler would.
    struct InterruptAfterFirstJob(CancelToken);

    impl BatchObserver for InterruptAfterFirstJob {
        fn job_finished(&mut self, result: &JobResult) {
            if result.index == 0 {
                let token = self.0.clone();
                std::thread::spawn(move || token.cancel()).join().unwrap();
            }
        }
    }

    #[test]
    fn cancel_from_another_thread_keeps_finished_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new();
        let token = CancelToken::new();
        let jobs = vec![
            ConversionJob::text("a", "First."),
            ConversionJob::text("b", "Second."),
            ConversionJob::text("c", "Third."),
        ];

        let mut observer = InterruptAfterFirstJob(token.clone());
        let report = run_batch(&api, "sk_test", &jobs, &options(dir.path()), &token, &mut observer)
            .unwrap();

        assert_eq!(report.len(), 3);
        assert!(report.results[0].is_completed());
        assert_eq!(report.cancelled(), 2);
        assert_eq!(api.synth_calls.borrow().len(), 1);
        assert!(dir.path().join("a.mp3").exists());
        assert!(!dir.path().join("b.mp3").exists());
    }

    #[test]
    fn duplicate_stems_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new();
        let jobs = vec![
            ConversionJob::text("notes", "one"),
            ConversionJob::text("notes", "two"),
            ConversionJob::text("my notes?", "three"),
        ];
        let report = run(&api, &jobs, &options(dir.path()));

        let outputs: Vec<PathBuf> = report
            .results
            .iter()
            .map(|r| match &r.outcome {
                JobOutcome::Completed { output, .. } => output.clone(),
                other => panic!("unexpected outcome {other:?}"),
            })
            .collect();
        assert_eq!(
            outputs,
            vec![
                dir.path().join("notes.mp3"),
                dir.path().join("notes_2.mp3"),
                dir.path().join("my_notes_.mp3"),
            ]
        );
    }

    #[test]
    fn pcm_output_is_written_as_wav() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new().then_audio(&[1, 0, 2, 0]);
        let mut opts = options(dir.path());
        opts.params.output_format = OutputFormat::Pcm { sample_rate: 16000 };

        let report = run(&api, &[ConversionJob::text("clip", "Hi.")], &opts);
        assert!(report.results[0].is_completed());
        let reader = hound::WavReader::open(dir.path().join("clip.wav")).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn configuration_errors_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new();
        let jobs = vec![ConversionJob::text("a", "b")];
        let token = CancelToken::new();

        let opts = options(dir.path());
        assert!(matches!(
            run_batch(&api, "  ", &jobs, &opts, &token, &mut NoopObserver),
            Err(BatchError::NoApiKeys)
        ));

        let mut bad = options(dir.path());
        bad.params.voice_settings.stability = 3.0;
        assert!(matches!(
            run_batch(&api, "sk", &jobs, &bad, &token, &mut NoopObserver),
            Err(BatchError::InvalidParameter(_))
        ));

        let file = dir.path().join("plain-file");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            run_batch(&api, "sk", &jobs, &options(&file), &token, &mut NoopObserver),
            Err(BatchError::OutputDir { .. })
        ));
        assert!(api.synth_calls.borrow().is_empty());
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl BatchObserver for Recorder {
        fn job_started(&mut self, index: usize, _job: &ConversionJob, chunks: usize) {
            self.events.push(format!("start {index} {chunks}"));
        }
        fn chunk_synthesized(&mut self, index: usize, chunk: usize, _chunks: usize) {
            self.events.push(format!("chunk {index} {chunk}"));
        }
        fn job_finished(&mut self, result: &JobResult) {
            self.events.push(format!("done {} {}", result.index, result.is_completed()));
        }
    }

    #[test]
    fn output_dir_check_leaves_no_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        prepare_output_dir(dir.path()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_output_dir_is_fatal_before_any_request() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("locked");
        fs::create_dir(&out).unwrap();
        // Group-writable, so the mode bits do not look read-only, but the
        // owner itself may not write.
        fs::set_permissions(&out, fs::Permissions::from_mode(0o575)).unwrap();
        if fs::write(out.join("write-check"), b"").is_ok() {
            // Running with privileges that bypass permission checks.
            return;
        }

        let api = ScriptedApi::new();
        let result = run_batch(
            &api,
            "sk_test",
            &[ConversionJob::text("a", "Hello.")],
            &options(&out),
            &CancelToken::new(),
            &mut NoopObserver,
        );
        fs::set_permissions(&out, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(BatchError::OutputDir { .. })));
        assert!(api.synth_calls.borrow().is_empty());
    }

    #[test]
    fn observer_sees_progress() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new();
        let opts = BatchOptionsBuilder::default()
            .output_dir(dir.path().to_path_buf())
            .max_chunk_chars(12usize)
            .build()
            .unwrap();
        let jobs = vec![ConversionJob::text("a", "One two. Three four.")];
        let mut recorder = Recorder::default();

        run_batch(&api, "sk", &jobs, &opts, &CancelToken::new(), &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec!["start 0 2", "chunk 0 0", "chunk 0 1", "done 0 true"]
        );
    }
}
