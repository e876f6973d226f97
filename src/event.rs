use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal was resized
  Resize,
  /// Periodic tick for UI refresh and query polling
  Tick,
}

/// Subscription to terminal input and a tick timer.
///
/// The reader runs on a blocking thread until `stop` is called or the handler
/// is dropped; it notices the stop flag within one tick.
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
  stop: Arc<AtomicBool>,
  reader: Option<JoinHandle<()>>,
}

impl EventHandler {
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    let stop = Arc::new(AtomicBool::new(false));

    let stop_flag = Arc::clone(&stop);
    let reader = tokio::task::spawn_blocking(move || {
      while !stop_flag.load(Ordering::Relaxed) {
        let event = if event::poll(tick_rate).unwrap_or(false) {
          match event::read() {
            Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
            Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
            _ => continue,
          }
        } else {
          Event::Tick
        };

        if tx.send(event).is_err() {
          break;
        }
      }
      debug!("event reader stopped");
    });

    Self {
      rx,
      stop,
      reader: Some(reader),
    }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }

  /// Cancel the subscription and wait for the reader to exit.
  pub async fn stop(&mut self) {
    self.stop.store(true, Ordering::Relaxed);
    self.rx.close();
    if let Some(reader) = self.reader.take() {
      let _ = reader.await;
    }
  }
}

impl Drop for EventHandler {
  fn drop(&mut self) {
    self.stop.store(true, Ordering::Relaxed);
  }
}
