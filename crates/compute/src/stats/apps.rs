use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use callscope_core::{CallRecord, CallType};

/// Directional call counts for one application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCounts {
    pub incoming: u64,
    pub outgoing: u64,
}

/// Per-application breakdown in first-seen order.
///
/// Only records carrying both an app and a directional type contribute.
#[derive(Debug, Clone, Default)]
pub struct AppBreakdown {
    apps: IndexMap<String, AppCounts>,
}

impl AppBreakdown {
    pub fn observe(&mut self, rec: &CallRecord) {
        let Some(app) = rec.app.as_deref().filter(|a| !a.is_empty()) else {
            return;
        };
        match rec.call_type {
            Some(CallType::Incoming) => self.entry(app).incoming += 1,
            Some(CallType::Outgoing) => self.entry(app).outgoing += 1,
            _ => {}
        }
    }

    fn entry(&mut self, app: &str) -> &mut AppCounts {
        if !self.apps.contains_key(app) {
            self.apps.insert(app.to_string(), AppCounts::default());
        }
        &mut self.apps[app]
    }

    pub fn finish(self) -> IndexMap<String, AppCounts> {
        self.apps
    }
}
