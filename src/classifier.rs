use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::debug;

use crate::{Chroma, Error, Norm, Result, TemplateBank};

/// The chord chosen for one analysis frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameLabel {
    pub index: usize,
    pub name: String,
}

/// Returns the name of the template with the largest inner product with
/// `frame`. Equal scores resolve to the template declared first: the choice
/// is arbitrary but stable across runs.
pub fn classify<'a>(frame: &Chroma, bank: &'a TemplateBank) -> Result<&'a str> {
    best_match(0, frame, bank)
}

/// Classifies every frame in order, after scaling each by `norm`.
pub fn classify_frames<'a>(
    frames: &[Chroma],
    bank: &'a TemplateBank,
    norm: Norm,
) -> Result<Vec<&'a str>> {
    frames
        .iter()
        .enumerate()
        .map(|(i, f)| match norm {
            Norm::None => best_match(i, f, bank),
            _ => {
                let mut f = f.clone();
                norm.apply(f.as_mut_slice());
                best_match(i, &f, bank)
            }
        })
        .collect()
}

fn best_match<'a>(index: usize, frame: &Chroma, bank: &'a TemplateBank) -> Result<&'a str> {
    if frame.len() != bank.dimension() {
        return Err(Error::DimensionMismatch {
            expected: bank.dimension(),
            found: frame.len(),
            frame: index,
        });
    }

    let mut best: Option<(&str, f32)> = None;
    for t in bank.iter() {
        let score = frame.dot(&t.vector);
        match best {
            Some((_, s)) if score <= s => {}
            // NaN never displaces the current best.
            Some(_) if score.is_nan() => {}
            _ => best = Some((t.name.as_str(), score)),
        }
    }

    best.map(|(name, _)| name)
        .ok_or_else(|| Error::Config("no chord templates defined".into()))
}

/// How long the stage blocks on either channel before re-checking for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Classifier labels chroma frames on a background thread as they arrive.
pub struct Classifier {
    recv: Option<Receiver<Result<FrameLabel>>>,
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Classifier {
    pub fn start(bank: Arc<TemplateBank>, norm: Norm, frames: Receiver<Chroma>) -> Self {
        let (send, recv) = sync_channel(16);
        let shutdown = Arc::new(AtomicBool::new(false));

        let shutdown2 = shutdown.clone();
        let thread = Some(thread::spawn(move || {
            Classifier::mainloop(send, shutdown2, bank, norm, frames);
        }));

        Self {
            shutdown,
            thread,
            recv: Some(recv),
        }
    }

    /// The label stream. It ends after the frame sender hangs up, or right
    /// after the first error.
    pub fn take_receiver(&mut self) -> Option<Receiver<Result<FrameLabel>>> {
        self.recv.take()
    }

    fn mainloop(
        tx: SyncSender<Result<FrameLabel>>,
        shutdown: Arc<AtomicBool>,
        bank: Arc<TemplateBank>,
        norm: Norm,
        frames: Receiver<Chroma>,
    ) {
        let mut index = 0;

        loop {
            if shutdown.load(std::sync::atomic::Ordering::SeqCst) {
                return;
            }
            let mut frame = match frames.recv_timeout(POLL_INTERVAL) {
                Ok(f) => f,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("frame source closed after {} frames", index);
                    return;
                }
            };
            if shutdown.load(std::sync::atomic::Ordering::SeqCst) {
                return;
            }

            norm.apply(frame.as_mut_slice());
            let out = best_match(index, &frame, &bank).map(|name| FrameLabel {
                index,
                name: name.to_owned(),
            });
            let failed = out.is_err();
            index += 1;

            let mut pending = out;
            loop {
                match tx.try_send(pending) {
                    Ok(()) => break,
                    Err(TrySendError::Full(back)) => {
                        if shutdown.load(std::sync::atomic::Ordering::SeqCst) {
                            return;
                        }
                        pending = back;
                        thread::sleep(POLL_INTERVAL);
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        debug!("label receiver gone, classifier thread shutting down");
                        return;
                    }
                }
            }
            if failed {
                return;
            }
        }
    }
}

impl Drop for Classifier {
    fn drop(&mut self) {
        self.shutdown
            .store(true, std::sync::atomic::Ordering::SeqCst);
        self.recv.take();
        if let Some(hnd) = self.thread.take() {
            hnd.join().ok();
        }
    }
}
