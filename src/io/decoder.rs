//! Audio decoding using Symphonia

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::signal::AudioSignal;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Decode an audio file to planar PCM
///
/// Decodes the first audio track of any container/codec Symphonia was built
/// with. Samples are converted to `f32` in [-1.0, 1.0]; channels are kept
/// separate.
///
/// # Errors
///
/// - `IoFailure` if the file cannot be opened
/// - `DecodingError` if the container or codec is not recognised
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<AudioSignal, AnalysisError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let file = File::open(path).map_err(|source| AnalysisError::IoFailure {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decoding_error(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            AnalysisError::DecodingError(format!("{}: no supported audio track", path.display()))
        })?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params.sample_rate.ok_or_else(|| {
        AnalysisError::DecodingError(format!("{}: unknown sample rate", path.display()))
    })?;
    let mut channel_count = codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decoding_error(path, e))?;

    let mut interleaved: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decoding_error(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channel_count = spec.channels.count();
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupted packets are skipped, the rest of the stream is still usable
                log::warn!("{}: skipping undecodable packet: {}", path.display(), msg);
            }
            Err(e) => return Err(decoding_error(path, e)),
        }
    }

    if channel_count == 0 {
        return Err(AnalysisError::DecodingError(format!(
            "{}: unknown channel layout",
            path.display()
        )));
    }

    log::debug!(
        "Decoded {} frames, {} channel(s) at {} Hz",
        interleaved.len() / channel_count,
        channel_count,
        sample_rate
    );

    AudioSignal::from_interleaved(sample_rate, channel_count, &interleaved)
}

/// Decode a file and check it against the configured input format
///
/// # Errors
///
/// Everything [`decode_audio`] returns, plus `UnsupportedAudioFormat` when
/// the sample rate or channel count differ from `source_sample_rate` /
/// `channel_count`.
pub fn load_signal<P: AsRef<Path>>(
    path: P,
    config: &AnalysisConfig,
) -> Result<AudioSignal, AnalysisError> {
    let signal = decode_audio(path)?;
    signal.ensure_format(config.source_sample_rate, config.channel_count)?;
    Ok(signal)
}

fn decoding_error(path: &Path, err: SymphoniaError) -> AnalysisError {
    match err {
        SymphoniaError::IoError(source) => AnalysisError::IoFailure {
            path: path.to_path_buf(),
            source,
        },
        other => AnalysisError::DecodingError(format!("{}: {}", path.display(), other)),
    }
}
