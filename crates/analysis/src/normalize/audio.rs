use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, CODEC_TYPE_OPUS, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::opus_decoder::{OPUS_SAMPLE_RATE, OpusDecoder};
use super::resampler::resample_clip;
use super::{PcmAudio, TARGET_CHANNELS, TARGET_SAMPLE_RATE, f32_to_i16, i16_to_f32};
use crate::error::AnalysisError;

/// Browsers hand us MediaRecorder output (WebM/Ogg Opus) under this name.
const BROWSER_RECORDING_NAME: &str = "recording.wav";

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
const OGG_MAGIC: &[u8] = b"OggS";

/// Decoded audio before it has been conformed to the canonical format.
#[derive(Debug)]
struct DecodedAudio {
    samples: Samples,
    sample_rate: u32,
    channels: u16,
}

/// Interleaved samples in whichever precision the source offered.
#[derive(Debug)]
enum Samples {
    /// 16-bit PCM straight from a WAV file; kept intact so canonical input passes through.
    I16(Vec<i16>),
    F32(Vec<f32>),
}

/// Decodes an uploaded audio file into canonical 22050 Hz mono 16-bit PCM.
pub fn normalize_audio(
    bytes: &[u8],
    filename: &str,
    content_type: Option<&str>,
) -> Result<PcmAudio, AnalysisError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let decoded = if is_browser_recording(filename, content_type) {
        match decode_web_audio(bytes) {
            Ok(audio) => audio,
            Err(compressed_err) => {
                debug!(%compressed_err, "Browser recording is not web audio, retrying as WAV");
                decode_wav(bytes).map_err(|wav_err| {
                    AnalysisError::Decode(format!(
                        "not web audio ({compressed_err}) and not WAV ({wav_err})"
                    ))
                })?
            }
        }
    } else if extension.as_deref() == Some("wav") {
        decode_wav(bytes)?
    } else {
        decode_container(bytes, extension.as_deref())?
    };

    conform(decoded)
}

/// True for uploads whose name or MIME type point at a MediaRecorder stream.
fn is_browser_recording(filename: &str, content_type: Option<&str>) -> bool {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if basename.eq_ignore_ascii_case(BROWSER_RECORDING_NAME) {
        return true;
    }
    content_type
        .map(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("webm") || ct.contains("ogg")
        })
        .unwrap_or(false)
}

/// Decodes a WebM or Ogg stream, refusing anything without their signature.
fn decode_web_audio(bytes: &[u8]) -> Result<DecodedAudio, AnalysisError> {
    let container = if bytes.starts_with(&EBML_MAGIC) {
        "webm"
    } else if bytes.starts_with(OGG_MAGIC) {
        "ogg"
    } else {
        return Err(AnalysisError::Decode("no WebM or Ogg signature".to_string()));
    };
    decode_container(bytes, Some(container))
}

fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio, AnalysisError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| AnalysisError::Decode(format!("wav: {e}")))?;
    let spec = reader.spec();

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => Samples::I16(
            reader
                .into_samples::<i16>()
                .collect::<Result<_, _>>()
                .map_err(|e| AnalysisError::Decode(format!("wav samples: {e}")))?,
        ),
        (hound::SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            Samples::F32(
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| AnalysisError::Decode(format!("wav samples: {e}")))?,
            )
        }
        (hound::SampleFormat::Float, _) => Samples::F32(
            reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| AnalysisError::Decode(format!("wav samples: {e}")))?,
        ),
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Demuxes any container symphonia knows and decodes its first audio track.
fn decode_container(bytes: &[u8], extension: Option<&str>) -> Result<DecodedAudio, AnalysisError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AnalysisError::Decode(format!("probe: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::Decode("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    // symphonia demuxes Opus but ships no Opus codec.
    if codec_params.codec == CODEC_TYPE_OPUS {
        return decode_opus_track(format.as_mut(), track_id);
    }

    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::Decode("unknown sample rate".to_string()))?;
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::Decode(format!("codec: {e}")))?;

    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(AnalysisError::Decode(format!("packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(AnalysisError::Decode(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }
        channels = spec.channels.count();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    if interleaved.is_empty() {
        return Err(AnalysisError::Decode("no audio samples decoded".to_string()));
    }

    Ok(DecodedAudio {
        samples: Samples::F32(interleaved),
        sample_rate: source_rate,
        channels: channels as u16,
    })
}

fn decode_opus_track(
    format: &mut dyn FormatReader,
    track_id: u32,
) -> Result<DecodedAudio, AnalysisError> {
    let mut opus = OpusDecoder::new()?;
    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(AnalysisError::Decode(format!("packet: {e}"))),
        };
        if packet.track_id() != track_id
            || packet.data.is_empty()
            || is_opus_header(&packet.data)
        {
            continue;
        }
        mono.extend(opus.decode_to_mono(&packet.data)?);
    }

    if mono.is_empty() {
        return Err(AnalysisError::Decode("no opus samples decoded".to_string()));
    }

    debug!(samples = mono.len(), "Decoded Opus web recording");

    Ok(DecodedAudio {
        samples: Samples::F32(mono),
        sample_rate: OPUS_SAMPLE_RATE,
        channels: 1,
    })
}

/// Ogg Opus identification and comment packets carry no audio.
fn is_opus_header(data: &[u8]) -> bool {
    data.starts_with(b"OpusHead") || data.starts_with(b"OpusTags")
}

/// Down-mixes and resamples as needed. Canonical 16-bit input is returned untouched.
fn conform(audio: DecodedAudio) -> Result<PcmAudio, AnalysisError> {
    if audio.channels == 0 {
        return Err(AnalysisError::Decode("audio reports zero channels".to_string()));
    }

    if audio.sample_rate == TARGET_SAMPLE_RATE && audio.channels == TARGET_CHANNELS {
        if let Samples::I16(samples) = audio.samples {
            return Ok(PcmAudio {
                samples,
                sample_rate: TARGET_SAMPLE_RATE,
                channels: TARGET_CHANNELS,
            });
        }
    }

    let interleaved: Vec<f32> = match audio.samples {
        Samples::I16(samples) => samples.into_iter().map(i16_to_f32).collect(),
        Samples::F32(samples) => samples,
    };

    let channels = audio.channels as usize;
    let mono: Vec<f32> = if channels > 1 {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        interleaved
    };

    let resampled = resample_clip(&mono, audio.sample_rate, TARGET_SAMPLE_RATE)?;

    debug!(
        source_rate = audio.sample_rate,
        source_channels = channels,
        samples = resampled.len(),
        "Audio conformed to 22050Hz mono"
    );

    Ok(PcmAudio {
        samples: resampled.into_iter().map(f32_to_i16).collect(),
        sample_rate: TARGET_SAMPLE_RATE,
        channels: TARGET_CHANNELS,
    })
}
