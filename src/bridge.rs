// ============================================================================
// HOST BRIDGE: outbound messages from the inspector to its host
// ============================================================================

use std::sync::mpsc;

/// The only message the inspector ever sends outward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostMessage {
    /// Put `text` on the system clipboard and confirm to the user.
    Copy { text: String },
}

/// Delivers host messages.  `Ok` carries the confirmation to show the user.
pub trait HostBridge {
    fn deliver(&mut self, msg: &HostMessage) -> Result<String, String>;
}

fn confirmation(text: &str) -> String {
    format!("Copied: {}", text)
}

/// Writes copy requests to the OS clipboard via arboard.
///
/// The clipboard handle is opened lazily and kept, since some platforms
/// (X11) drop the clipboard contents when the owning handle goes away.
#[derive(Default)]
pub struct ClipboardBridge {
    clipboard: Option<arboard::Clipboard>,
}

impl ClipboardBridge {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostBridge for ClipboardBridge {
    fn deliver(&mut self, msg: &HostMessage) -> Result<String, String> {
        let HostMessage::Copy { text } = msg;
        if self.clipboard.is_none() {
            let clip = arboard::Clipboard::new()
                .map_err(|e| format!("clipboard unavailable: {}", e))?;
            self.clipboard = Some(clip);
        }
        let Some(clip) = self.clipboard.as_mut() else {
            return Err("clipboard unavailable".to_string());
        };
        clip.set_text(text.clone())
            .map_err(|e| format!("clipboard write failed: {}", e))?;
        log_info!("Copied to clipboard: {}", text);
        Ok(confirmation(text))
    }
}

/// Forwards host messages to an in-process receiver (headless hosts, tests).
pub struct ChannelBridge {
    sender: mpsc::Sender<HostMessage>,
}

impl ChannelBridge {
    pub fn new() -> (Self, mpsc::Receiver<HostMessage>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl HostBridge for ChannelBridge {
    fn deliver(&mut self, msg: &HostMessage) -> Result<String, String> {
        let HostMessage::Copy { text } = msg;
        self.sender
            .send(msg.clone())
            .map_err(|_| "host disconnected".to_string())?;
        Ok(confirmation(text))
    }
}

/// Deliver every message in order.  Returns the status line of the last
/// delivery; failures are logged and do not stop later messages.
pub fn deliver_all(bridge: &mut dyn HostBridge, messages: Vec<HostMessage>) -> Option<String> {
    let mut status = None;
    for msg in &messages {
        status = Some(match bridge.deliver(msg) {
            Ok(ack) => ack,
            Err(e) => {
                log_warn!("Host message not delivered: {}", e);
                e
            }
        });
    }
    status
}
