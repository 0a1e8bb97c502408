//! `TARGET:RADIUS[:PRIORITY]` queue entries given on the command line.

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub target: String,
    pub radius: i32,
    pub priority: i32,
}

impl FromStr for QueueEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let target = parts.next().unwrap_or_default().trim();
        if target.is_empty() {
            return Err(format!("missing target in '{s}'"));
        }
        let radius = parts
            .next()
            .ok_or_else(|| format!("missing radius in '{s}'"))?
            .parse::<i32>()
            .map_err(|e| format!("bad radius in '{s}': {e}"))?;
        let priority = match parts.next() {
            Some(p) => p
                .parse::<i32>()
                .map_err(|e| format!("bad priority in '{s}': {e}"))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(format!("too many fields in '{s}'"));
        }
        Ok(Self {
            target: target.to_string(),
            radius,
            priority,
        })
    }
}
