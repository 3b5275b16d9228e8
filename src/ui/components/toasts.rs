use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const TOAST_TTL: Duration = Duration::from_secs(3);

/// Severity of a toast, controls its footer color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Success,
  Error,
}

/// A short-lived notice shown in the footer
#[derive(Debug, Clone)]
pub struct Toast {
  pub level: ToastLevel,
  pub text: String,
}

/// Handle for emitting toasts from views and async tasks
#[derive(Clone)]
pub struct ToastSender {
  tx: mpsc::UnboundedSender<Toast>,
}

impl ToastSender {
  pub fn success(&self, text: impl Into<String>) {
    let _ = self.tx.send(Toast {
      level: ToastLevel::Success,
      text: text.into(),
    });
  }

  pub fn error(&self, text: impl Into<String>) {
    let _ = self.tx.send(Toast {
      level: ToastLevel::Error,
      text: text.into(),
    });
  }
}

struct ActiveToast {
  toast: Toast,
  expires_at: Instant,
}

/// Collects toasts from anywhere in the app and expires them after a few
/// seconds. The app drains the channel once per tick.
pub struct Toasts {
  tx: mpsc::UnboundedSender<Toast>,
  rx: mpsc::UnboundedReceiver<Toast>,
  active: Vec<ActiveToast>,
  ttl: Duration,
}

impl Toasts {
  pub fn new() -> Self {
    Self::with_ttl(TOAST_TTL)
  }

  pub fn with_ttl(ttl: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Toasts {
      tx,
      rx,
      active: Vec::new(),
      ttl,
    }
  }

  pub fn sender(&self) -> ToastSender {
    ToastSender {
      tx: self.tx.clone(),
    }
  }

  /// Admit newly sent toasts and drop expired ones
  pub fn tick(&mut self) {
    while let Ok(toast) = self.rx.try_recv() {
      self.active.push(ActiveToast {
        toast,
        expires_at: Instant::now() + self.ttl,
      });
    }
    let now = Instant::now();
    self.active.retain(|active| active.expires_at > now);
  }

  /// The most recent live toast, if any
  pub fn latest(&self) -> Option<&Toast> {
    self.active.last().map(|active| &active.toast)
  }
}
