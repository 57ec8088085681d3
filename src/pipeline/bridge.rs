//! Async bridge (requires the `async-bridge` feature)
//!
//! Runs the synchronous pipeline on tokio's blocking pool and forwards progress
//! over an unbounded tokio channel.

use tokio::sync::mpsc::UnboundedSender;

use super::{Pipeline, PipelineOutput, PipelineRequest, ProgressUpdate};
use crate::engine::AudioDecoder;
use crate::error::{BeatshiftError, Result};

/// Run `pipeline` without blocking the async runtime
pub async fn run_pipeline_async<D>(
    pipeline: Pipeline<D>,
    request: PipelineRequest,
    progress: UnboundedSender<ProgressUpdate>,
) -> Result<PipelineOutput>
where
    D: AudioDecoder + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut sink = |update: ProgressUpdate| {
            let _ = progress.send(update);
        };
        pipeline.run(request, &mut sink)
    })
    .await
    .map_err(|e| BeatshiftError::WorkerFailed {
        reason: e.to_string(),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::engine::{generate_click_train, SampleBuffer};
    use crate::genre::Genre;

    struct FixedDecoder(SampleBuffer);

    impl AudioDecoder for FixedDecoder {
        fn decode(&self, _bytes: &[u8]) -> Result<SampleBuffer> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_async_run_reports_progress() {
        let buffer = generate_click_train(120.0, 2.0, 8000, 50).unwrap();
        let pipeline =
            Pipeline::with_decoder(PipelineConfig::default(), FixedDecoder(buffer)).unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let request = PipelineRequest::new(vec![], Genre::Hardstyle);
        let output = run_pipeline_async(pipeline, request, tx).await.unwrap();

        let mut percentages = Vec::new();
        while let Some(update) = rx.recv().await {
            percentages.push(update.percent);
        }
        assert_eq!(percentages, vec![20, 40, 60, 80, 100]);
        assert_eq!(output.report.target_bpm, 150);
    }
}
