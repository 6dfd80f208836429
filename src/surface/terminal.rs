use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::Mutex;

use tracing::debug;

use crate::form::request::FieldValue;
use crate::notify::notification::{Notification, NotificationId};
use crate::surface::surface::{ControlId, ControlState, Navigation, Surface};

/// Surface for the command-line driver.
///
/// Field values come from the command line, banners and navigations are
/// printed to stdout, confirmations are asked on stdin unless `assume_yes`.
pub struct TerminalSurface {
    fields: HashMap<String, FieldValue>,
    controls: Mutex<HashMap<ControlId, ControlState>>,
    assume_yes: bool,
}

impl TerminalSurface {
    pub fn new(fields: HashMap<String, FieldValue>, assume_yes: bool) -> Self {
        Self {
            fields,
            controls: Mutex::new(HashMap::new()),
            assume_yes,
        }
    }

    fn control_state(&self, control: &ControlId) -> ControlState {
        self.controls
            .lock()
            .ok()
            .and_then(|controls| controls.get(control).cloned())
            .unwrap_or_else(|| ControlState::enabled(control.as_str()))
    }
}

impl Surface for TerminalSurface {
    fn read_field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).cloned()
    }

    fn set_busy(&self, control: &ControlId, busy_label: &str) -> ControlState {
        let prior = self.control_state(control);
        if let Ok(mut controls) = self.controls.lock() {
            controls.insert(
                control.clone(),
                ControlState {
                    label: busy_label.to_string(),
                    disabled: true,
                },
            );
        }
        println!("[{}] {}", control, busy_label);
        prior
    }

    fn clear_busy(&self, control: &ControlId, prior: ControlState) {
        debug!(control = %control, label = %prior.label, "control restored");
        if let Ok(mut controls) = self.controls.lock() {
            controls.insert(control.clone(), prior);
        }
    }

    fn render_notification(&self, id: NotificationId, notification: &Notification) {
        println!("#{} [{}] {}", id, notification.kind, notification.message);
    }

    fn remove_notification(&self, id: NotificationId) {
        debug!(notification = %id, "notification removed");
    }

    fn navigate(&self, target: &Navigation) {
        match target {
            Navigation::Url(url) => println!("-> navigate to {}", url),
            Navigation::Reload => println!("-> reload page"),
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{} [y/N] ", prompt);
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn set_text(&self, element: &str, text: &str) {
        println!("{}:", element);
        for line in text.lines() {
            println!("  {}", line);
        }
    }
}
