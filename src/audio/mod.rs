//! Audio I/O for the CLI frontend.
//!
//! Reads interleaved little-endian `f32` PCM from stdin, processes it in
//! planar blocks and writes the same format to stdout.

use std::io::{self, Read, Write};

use crate::error::{DisruptionError, Result};
use crate::Processor;

/// Audio input reader from any byte stream.
pub struct AudioInput<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: Read> AudioInput<R> {
    /// Create a reader holding up to `frames · channels` samples per read.
    pub fn new(reader: R, frames: usize, channels: usize) -> Self {
        Self {
            reader,
            buffer: vec![0u8; frames * channels * 4], // 4 bytes per f32
        }
    }

    /// Fill `samples` with interleaved samples.
    /// Returns the number of samples read, or 0 on EOF.
    ///
    /// Keeps reading until the buffer is full or the stream ends, so frames
    /// are never split across calls.
    pub fn read_block(&mut self, samples: &mut [f32]) -> Result<usize> {
        let bytes_to_read = (samples.len() * 4).min(self.buffer.len());
        let buffer = &mut self.buffer[..bytes_to_read];

        let mut filled = 0;
        while filled < bytes_to_read {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(DisruptionError::AudioInputError {
                        message: e.to_string(),
                    })
                }
            }
        }

        let samples_read = filled / 4;
        for (sample, bytes) in samples.iter_mut().zip(buffer[..samples_read * 4].chunks_exact(4)) {
            *sample = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        Ok(samples_read)
    }
}

/// Audio output writer to any byte sink.
pub struct AudioOutput<W> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> AudioOutput<W> {
    /// Create a writer sized for `frames · channels` samples per write.
    pub fn new(writer: W, frames: usize, channels: usize) -> Self {
        Self {
            writer,
            buffer: vec![0u8; frames * channels * 4],
        }
    }

    /// Write a block of interleaved samples.
    pub fn write_block(&mut self, samples: &[f32]) -> Result<()> {
        let bytes_needed = samples.len() * 4;
        if self.buffer.len() < bytes_needed {
            self.buffer.resize(bytes_needed, 0);
        }

        for (bytes, &sample) in self.buffer.chunks_exact_mut(4).zip(samples) {
            bytes.copy_from_slice(&sample.to_le_bytes());
        }

        self.writer
            .write_all(&self.buffer[..bytes_needed])
            .map_err(|e| DisruptionError::AudioOutputError {
                message: e.to_string(),
            })
    }

    /// Flush the output stream.
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| DisruptionError::AudioOutputError {
                message: e.to_string(),
            })
    }
}

/// Split interleaved frames into per-channel buffers.
fn deinterleave(interleaved: &[f32], planar: &mut [Vec<f32>], frames: usize) {
    let channels = planar.len();
    for (ch, samples) in planar.iter_mut().enumerate() {
        for (frame, sample) in samples[..frames].iter_mut().enumerate() {
            *sample = interleaved[frame * channels + ch];
        }
    }
}

/// Merge per-channel buffers back into interleaved frames.
fn interleave(planar: &[Vec<f32>], interleaved: &mut [f32], frames: usize) {
    let channels = planar.len();
    for (ch, samples) in planar.iter().enumerate() {
        for (frame, &sample) in samples[..frames].iter().enumerate() {
            interleaved[frame * channels + ch] = sample;
        }
    }
}

/// Stream `reader` through `processor` into `writer`.
///
/// Uses the processor's negotiated channel count and maximum block size.
/// A trailing partial frame is dropped. Returns the number of frames
/// processed.
pub fn process_stream<R: Read, W: Write>(
    processor: &mut Processor,
    reader: R,
    writer: W,
) -> Result<usize> {
    let channels = processor.spec().channels;
    let frames_per_block = processor.spec().max_block_size;

    let mut input = AudioInput::new(reader, frames_per_block, channels);
    let mut output = AudioOutput::new(writer, frames_per_block, channels);

    let mut interleaved = vec![0.0f32; frames_per_block * channels];
    let mut planar = vec![vec![0.0f32; frames_per_block]; channels];
    let mut total = 0;

    loop {
        let samples_read = input.read_block(&mut interleaved)?;
        let frames = samples_read / channels;
        if frames == 0 {
            break;
        }

        deinterleave(&interleaved, &mut planar, frames);
        {
            let mut block: Vec<&mut [f32]> =
                planar.iter_mut().map(|ch| &mut ch[..frames]).collect();
            processor.process_block(&mut block);
        }
        interleave(&planar, &mut interleaved, frames);

        output.write_block(&interleaved[..frames * channels])?;
        total += frames;
    }

    output.flush()?;
    Ok(total)
}

/// Process audio from stdin to stdout using the given processor.
pub fn process_audio(processor: &mut Processor) -> Result<usize> {
    process_stream(processor, io::stdin().lock(), io::stdout().lock())
}
