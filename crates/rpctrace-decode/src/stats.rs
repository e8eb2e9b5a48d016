//! Per-connection counts of called methods and commands.

use std::collections::HashMap;

use serde::Serialize;

use crate::control::{ControlMessage, ControlOp};
use crate::report::Direction;
use crate::rpc::RpcFrame;

/// Which group a counted name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TallyCategory {
    /// Control requests, as `channel.command`.
    ControlCommands,
    /// Control subscriptions, as `channel.event`.
    ControlEvents,
    /// Binary RPC methods called by the front end.
    ServerMethods,
    /// Binary RPC methods called by the back end.
    ClientMethods,
}

impl TallyCategory {
    pub const ALL: [TallyCategory; 4] = [
        Self::ControlCommands,
        Self::ControlEvents,
        Self::ServerMethods,
        Self::ClientMethods,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::ControlCommands => "Control commands",
            Self::ControlEvents => "Control events",
            Self::ServerMethods => "Server methods",
            Self::ClientMethods => "Client methods",
        }
    }
}

/// One summary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyRow {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: HashMap<TallyCategory, HashMap<String, u64>>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a control request or subscription. Other ops are ignored.
    pub fn record_control(&mut self, msg: &ControlMessage) {
        let category = match msg.op {
            ControlOp::Request => TallyCategory::ControlCommands,
            ControlOp::Subscribe => TallyCategory::ControlEvents,
            _ => return,
        };
        if let Some(target) = msg.target() {
            self.bump(category, target);
        }
    }

    /// Count a binary RPC request method under the side that issued it.
    pub fn record_rpc(&mut self, direction: Direction, frame: &RpcFrame) {
        let RpcFrame::Message(msg) = frame else {
            return;
        };
        let Some(method) = msg.method() else {
            return;
        };
        let category = match direction {
            Direction::Outbound => TallyCategory::ServerMethods,
            Direction::Inbound => TallyCategory::ClientMethods,
        };
        self.bump(category, method.to_string());
    }

    /// Add every count from `other`.
    pub fn merge(&mut self, other: &Tally) {
        for (category, names) in &other.counts {
            let entry = self.counts.entry(*category).or_default();
            for (name, count) in names {
                *entry.entry(name.clone()).or_default() += count;
            }
        }
    }

    /// Rows for one category, highest count first, ties by name.
    pub fn counts(&self, category: TallyCategory) -> Vec<TallyRow> {
        let mut rows: Vec<TallyRow> = self
            .counts
            .get(&category)
            .map(|names| {
                names
                    .iter()
                    .map(|(name, count)| TallyRow {
                        name: name.clone(),
                        count: *count,
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        rows
    }

    /// Number of distinct names in one category.
    pub fn unique_total(&self, category: TallyCategory) -> usize {
        self.counts.get(&category).map_or(0, HashMap::len)
    }

    /// Distinct names across every category.
    pub fn unique_names(&self) -> usize {
        TallyCategory::ALL
            .into_iter()
            .map(|category| self.unique_total(category))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(HashMap::is_empty)
    }

    fn bump(&mut self, category: TallyCategory, name: String) {
        *self
            .counts
            .entry(category)
            .or_default()
            .entry(name)
            .or_default() += 1;
    }
}
