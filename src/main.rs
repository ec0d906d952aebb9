#[cfg(not(feature = "streaming"))]
fn main() {
    eprintln!(
        "The snd-dma demo requires the \"streaming\" feature. Rebuild with `--features streaming` to enable playback."
    );
}

#[cfg(feature = "streaming")]
mod demo {
    use anyhow::{Context, Result};
    use snd_dma::{AudioDevice, DmaBuffer, DmaConfig, BYTES_PER_SAMPLE};
    use std::f32::consts::TAU;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const TONE_HZ: f32 = 440.0;
    const RUN_SECONDS: u64 = 3;
    /// Keep the mixer about half a ring ahead of the playback cursor
    const MIX_AHEAD_BYTES: usize = 8 * 1024;
    /// Largest burst mixed per pass, in bytes
    const MIX_BURST_BYTES: usize = 2048;

    /// Stereo sine generator standing in for a real software mixer
    struct SineMixer {
        phase: f32,
        step: f32,
        write_pos: usize,
    }

    impl SineMixer {
        fn new(sample_rate: u32) -> Self {
            SineMixer {
                phase: 0.0,
                step: TAU * TONE_HZ / sample_rate as f32,
                write_pos: 0,
            }
        }

        /// Mix `len_bytes` of interleaved stereo PCM into the DMA buffer
        /// and report them, advancing the mixer's own write cursor.
        fn mix_into(&mut self, dma: &DmaBuffer, len_bytes: usize) -> Result<()> {
            let frames = len_bytes / (2 * BYTES_PER_SAMPLE);
            let mut bytes = Vec::with_capacity(frames * 2 * BYTES_PER_SAMPLE);
            for _ in 0..frames {
                let sample = (self.phase.sin() * 0.25 * i16::MAX as f32) as i16;
                self.phase = (self.phase + self.step) % TAU;
                bytes.extend_from_slice(&sample.to_le_bytes()); // left
                bytes.extend_from_slice(&sample.to_le_bytes()); // right
            }
            dma.write_at(self.write_pos, &bytes)?;
            dma.report_write(bytes.len());
            self.write_pos = (self.write_pos + bytes.len()) % dma.capacity();
            Ok(())
        }
    }

    pub fn run() -> Result<()> {
        let config = DmaConfig::new(44_100, 2);
        let mut dma = DmaBuffer::new();
        dma.init(config).context("failed to initialize DMA buffer")?;
        let dma = Arc::new(dma);

        let device = AudioDevice::new(config.sample_rate, config.channels, Arc::clone(&dma))
            .context("failed to open audio device")?;

        println!("DMA Buffer Configuration:");
        println!("  Sample rate: {} Hz", config.sample_rate);
        println!(
            "  Ring capacity: {} bytes ({:.1}ms latency)",
            config.capacity,
            config.latency_ms()
        );
        println!("\nPlaying a {} Hz tone for {}s\n", TONE_HZ, RUN_SECONDS);

        let running = Arc::new(AtomicBool::new(true));
        let running_mixer = Arc::clone(&running);
        let dma_mixer = Arc::clone(&dma);

        let mixer_thread = std::thread::spawn(move || -> Result<()> {
            let mut mixer = SineMixer::new(config.sample_rate);
            while running_mixer.load(Ordering::Relaxed) {
                let buffered = dma_mixer.available();
                if buffered >= MIX_AHEAD_BYTES {
                    // Far enough ahead of the playback cursor; let it drain.
                    std::thread::sleep(Duration::from_millis(5));
                    continue;
                }
                let want = (MIX_AHEAD_BYTES - buffered).min(MIX_BURST_BYTES);
                mixer.mix_into(&dma_mixer, want)?;
            }
            Ok(())
        });

        for second in 1..=RUN_SECONDS {
            std::thread::sleep(Duration::from_secs(1));
            println!(
                "  {}s  playback position: {} samples",
                second,
                dma.read_position()
            );
        }

        running.store(false, Ordering::Relaxed);
        mixer_thread
            .join()
            .expect("mixer thread panicked")
            .context("mixer thread failed")?;

        device.finish();
        dma.shutdown();
        println!("\nPlayback complete");
        Ok(())
    }
}

#[cfg(feature = "streaming")]
fn main() {
    if let Err(err) = demo::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
