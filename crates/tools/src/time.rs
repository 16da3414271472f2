//! Current time lookup.
//!
//! An unknown timezone is an ordinary answer, not an error: the model can
//! relay it to the user and try a corrected name on the next round.

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use doppel_core::error::ToolError;
use doppel_core::tool::{Tool, ToolOutput};
use serde_json::{Value, json};

/// Reports the current time in a requested IANA timezone.
pub struct CurrentTimeTool {
    default_zone: Tz,
}

impl CurrentTimeTool {
    pub fn new(default_zone: Tz) -> Self {
        Self { default_zone }
    }

    /// Parse the configured default zone, falling back to Asia/Kolkata.
    pub fn with_default(zone_name: &str) -> Self {
        Self::new(zone_name.parse().unwrap_or(Tz::Asia__Kolkata))
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Accepts an optional IANA timezone \
         name like 'Asia/Kolkata' or 'America/New_York'."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone name; omit for the default"
                }
            }
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let zone = match arguments.get("timezone").and_then(|v| v.as_str()) {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    return Ok(ToolOutput::Text(format!(
                        "Unknown timezone '{name}'. Use an IANA name like 'Asia/Kolkata'."
                    )));
                }
            },
            None => self.default_zone,
        };

        let now = Utc::now().with_timezone(&zone);
        Ok(ToolOutput::Text(format!(
            "Current time in {zone}: {}",
            now.format("%Y-%m-%d %H:%M:%S %Z")
        )))
    }
}
