use std::convert::TryFrom;

use audiopus::coder::Decoder;
use audiopus::packet::Packet;
use audiopus::{Channels, MutSignals, SampleRate};

use crate::error::AnalysisError;

/// Opus always decodes at 48kHz regardless of the encoder's input rate.
pub const OPUS_SAMPLE_RATE: u32 = 48_000;

/// Maximum Opus frame: 120ms at 48kHz = 5760 samples/channel, stereo = 11520.
const MAX_FRAME_SIZE: usize = 5760 * 2;

/// Wraps libopus. Decodes the Opus packets demuxed from browser recordings.
pub struct OpusDecoder {
    decoder: Decoder,
    /// Interleaved stereo output buffer.
    decode_buf: Vec<f32>,
}

impl OpusDecoder {
    pub fn new() -> Result<Self, AnalysisError> {
        let decoder = Decoder::new(SampleRate::Hz48000, Channels::Stereo)
            .map_err(|e| AnalysisError::Decode(format!("failed to create Opus decoder: {e:?}")))?;
        Ok(Self {
            decoder,
            decode_buf: vec![0.0f32; MAX_FRAME_SIZE],
        })
    }

    /// Decodes an Opus packet into mono f32 PCM at 48kHz.
    ///
    /// Mono streams are upmixed by libopus, so the stereo down-mix is exact for them.
    pub fn decode_to_mono(&mut self, opus_data: &[u8]) -> Result<Vec<f32>, AnalysisError> {
        let output = MutSignals::try_from(&mut self.decode_buf[..])
            .map_err(|e| AnalysisError::Decode(format!("opus output buffer: {e:?}")))?;

        let packet = Packet::try_from(opus_data)
            .map_err(|e| AnalysisError::Decode(format!("opus packet: {e:?}")))?;

        let samples_per_channel = self
            .decoder
            .decode_float(Some(packet), output, false)
            .map_err(|e| AnalysisError::Decode(format!("opus decode: {e:?}")))?;

        // Down-mix interleaved stereo [L,R,L,R,...] to mono
        let mut mono = Vec::with_capacity(samples_per_channel);
        for i in 0..samples_per_channel {
            let left = self.decode_buf[i * 2];
            let right = self.decode_buf[i * 2 + 1];
            mono.push((left + right) * 0.5);
        }

        Ok(mono)
    }
}
