use std::path::PathBuf;
use std::time::Instant;

use tts_batch::{
    batch::{run_batch, BatchOptionsBuilder, ConversionJob, NoopObserver},
    credits::aggregate_credits,
    engines::elevenlabs::{ClientConfig, ElevenLabsClient},
    CancelToken, OutputFormat, SynthesisParams,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let api_key = std::env::var("ELEVENLABS_API_KEY")?;
    let client = ElevenLabsClient::new(ClientConfig::default())?;

    let credits = aggregate_credits(&client, [api_key.as_str()])?;
    println!("Remaining credits: {}", credits.total_remaining);

    let jobs = vec![
        ConversionJob::text(
            "greeting",
            "Hello! This is a short batch conversion. \
             Long inputs are split at paragraph and sentence boundaries, \
             and every piece ends up in the same output file.",
        ),
        ConversionJob::file("chapter1.txt"),
    ];

    let options = BatchOptionsBuilder::default()
        .params(SynthesisParams {
            output_format: OutputFormat::Pcm { sample_rate: 24000 },
            ..Default::default()
        })
        .output_dir(PathBuf::from("output"))
        .build()?;

    let start = Instant::now();
    let report = run_batch(
        &client,
        &api_key,
        &jobs,
        &options,
        &CancelToken::new(),
        &mut NoopObserver,
    )?;
    println!("Batch finished in {:.2?}", start.elapsed());

    for result in &report.results {
        println!("{result}");
    }
    Ok(())
}
